//! Admin API client (raffle operator → server).
//!
//! All requests carry the session token from [`RaffleClient::login`] as an
//! `Authorization: Bearer` header.
//!
//! [`RaffleClient::login`]: super::RaffleClient::login

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::auth::{AUTHORIZATION_HEADER, bearer_header};
use crate::objects::{DrawRequest, ParticipantId, PrizeId, RegisterAwardRequest, WinnerRecord};

/// Typed HTTP client for the raffle **Admin API**.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl AdminClient {
    /// Create a new `AdminClient` from an already issued session token.
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// The session token sent with every request.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// `POST /api/draw` – draw a random participant, optionally for a
    /// specific prize.
    pub async fn draw(&self, prize_id: Option<PrizeId>) -> Result<WinnerRecord, ClientError> {
        self.post_draw(DrawRequest {
            prize_id,
            participant_id: None,
        })
        .await
    }

    /// `POST /api/draw` – award a chosen participant, optionally for a
    /// specific prize.
    pub async fn draw_for(
        &self,
        participant_id: ParticipantId,
        prize_id: Option<PrizeId>,
    ) -> Result<WinnerRecord, ClientError> {
        self.post_draw(DrawRequest {
            prize_id,
            participant_id: Some(participant_id),
        })
        .await
    }

    /// `POST /api/awards` – register an award picked outside the server.
    pub async fn register_award(
        &self,
        participant_id: ParticipantId,
        prize_id: PrizeId,
    ) -> Result<WinnerRecord, ClientError> {
        let url = self.base_url.join("/api/awards")?;
        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION_HEADER, bearer_header(&self.token))
            .json(&RegisterAwardRequest {
                participant_id: Some(participant_id),
                prize_id: Some(prize_id),
            })
            .send()
            .await?;
        parse_response(resp).await
    }

    async fn post_draw(&self, request: DrawRequest) -> Result<WinnerRecord, ClientError> {
        let url = self.base_url.join("/api/draw")?;
        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION_HEADER, bearer_header(&self.token))
            .json(&request)
            .send()
            .await?;
        parse_response(resp).await
    }
}
