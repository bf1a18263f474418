//! Admin credential header helpers.
//!
//! Admin endpoints expect the session token issued by `POST /api/auth/login`
//! in a bearer-style header:
//!
//! ```text
//! Authorization: Bearer {token}
//! ```

/// Header carrying the admin session token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Authentication scheme expected in [`AUTHORIZATION_HEADER`].
pub const BEARER_SCHEME: &str = "Bearer";

/// Format the full `Authorization` header value for `token`.
pub fn bearer_header(token: &str) -> String {
    format!("{BEARER_SCHEME} {token}")
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively. Returns `None` when the value
/// is not exactly `<scheme> <token>` or the token is empty.
pub fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_round_trip() {
        let header = bearer_header("abc123");
        assert_eq!(header, "Bearer abc123");
        assert_eq!(parse_bearer(&header), Some("abc123"));
    }

    #[test]
    fn test_parse_bearer_is_case_insensitive() {
        assert_eq!(parse_bearer("bearer tok"), Some("tok"));
        assert_eq!(parse_bearer("BEARER tok"), Some("tok"));
    }

    #[test]
    fn test_parse_bearer_rejects_malformed() {
        assert_eq!(parse_bearer(""), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_bearer("Bearer a b"), None);
    }
}
