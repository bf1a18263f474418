//! Public API client (wheel display, audience screens).

use reqwest::Client;
use url::Url;

use super::admin::AdminClient;
use super::live::LiveStream;
use super::{ClientError, parse_response};
use crate::objects::{LoginRequest, LoginResponse, RaffleState, WinnerRecord, WinnersQuery};

/// Typed HTTP client for the unauthenticated raffle endpoints.
#[derive(Debug, Clone)]
pub struct RaffleClient {
    http: Client,
    base_url: Url,
}

impl RaffleClient {
    /// Create a new `RaffleClient`.
    ///
    /// * `base_url` – root URL of the raffle server (e.g. `http://localhost:8080`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/state` – current pools and recent winners.
    pub async fn state(&self) -> Result<RaffleState, ClientError> {
        let url = self.base_url.join("/api/state")?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/winners` – award history, most recent first.
    pub async fn winners(&self, limit: Option<usize>) -> Result<Vec<WinnerRecord>, ClientError> {
        let url = self.base_url.join("/api/winners")?;
        let resp = self
            .http
            .get(url)
            .query(&WinnersQuery { limit })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/auth/login` – exchange the admin secret for a session
    /// token and return an [`AdminClient`] that carries it.
    pub async fn login(&self, password: impl Into<String>) -> Result<AdminClient, ClientError> {
        let url = self.base_url.join("/api/auth/login")?;
        let resp = self
            .http
            .post(url)
            .json(&LoginRequest {
                password: password.into(),
            })
            .send()
            .await?;
        let LoginResponse { token } = parse_response(resp).await?;
        Ok(AdminClient::new(self.base_url.clone(), token).with_http_client(self.http.clone()))
    }

    /// `GET /ws` – open the live-update stream.
    ///
    /// The first event received is always a `state` snapshot (or `error`).
    pub async fn live(&self) -> Result<LiveStream, ClientError> {
        let mut url = self.base_url.join("/ws")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // Only fails for cannot-be-a-base URLs, which `join` above rules out.
        let _ = url.set_scheme(scheme);
        LiveStream::connect(url.as_str()).await
    }
}
