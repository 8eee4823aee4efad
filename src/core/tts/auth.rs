//! WebSocket-auth exchange.
//!
//! One POST to the auth endpoint trades the account credentials for a
//! short-lived, pre-authorized socket URL. Rejection statuses map onto the
//! distinct [`AuthError`] variants so callers can tell a bad key from a
//! conflicting in-flight operation from a server fault.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::messages::WsAuthResponse;
use crate::error::AuthError;

/// Error body shape used by the auth endpoint. Field names vary across
/// deployments, hence the aliases.
#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    #[serde(alias = "error", alias = "detail", alias = "error_message")]
    message: Option<String>,
}

/// Performs the auth exchange and returns the vended socket URL.
pub async fn fetch_websocket_url(
    client: &reqwest::Client,
    auth_url: &str,
    api_key: &str,
    user_id: &str,
) -> Result<Url, AuthError> {
    let response = client
        .post(auth_url)
        .header("Authorization", format!("Bearer {api_key}"))
        .header("X-User-Id", user_id)
        .header("Content-Type", "application/json")
        .send()
        .await
        .map_err(|e| AuthError::Http(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        let body: WsAuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        let url = Url::parse(&body.websocket_url).map_err(|e| {
            AuthError::MalformedResponse(format!(
                "invalid websocket_url {:?}: {e}",
                body.websocket_url
            ))
        })?;
        debug!(host = ?url.host_str(), "websocket auth succeeded");
        return Ok(url);
    }

    let message = error_message(response).await;
    Err(match status.as_u16() {
        401 => AuthError::Rejected(message),
        // The service answers 403 while another synthesis on the same
        // account is still in flight.
        403 => AuthError::Conflict(message),
        code => AuthError::Server {
            status: code,
            message,
        },
    })
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) if !body.is_empty() => match serde_json::from_str::<AuthErrorBody>(&body) {
            Ok(AuthErrorBody {
                message: Some(message),
            }) => message,
            _ => body,
        },
        _ => format!("HTTP {status}"),
    }
}
