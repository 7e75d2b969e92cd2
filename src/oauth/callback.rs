use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::error::DaisyconError;

/// Accept one redirect on the loopback `port` and return the authorization code.
///
/// The `state` query parameter must match `expected_state`.
pub async fn listen_for_callback(
    port: u16,
    expected_state: &str,
    timeout: Duration,
) -> Result<String, DaisyconError> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;

    let accept_future = async {
        let (mut stream, _) = listener.accept().await?;

        let mut buf = vec![0u8; 8192];
        let n = stream.read(&mut buf).await?;
        let request = String::from_utf8_lossy(&buf[..n]);
        let outcome = parse_callback(&request, expected_state);

        let (status, body) = match &outcome {
            Ok(_) => (
                "200 OK",
                "<!DOCTYPE html><html><body><h1>Authorization complete</h1>\
                 <p>You can close this window and return to the terminal.</p></body></html>",
            ),
            Err(_) => (
                "400 Bad Request",
                "<!DOCTYPE html><html><body><h1>Authorization failed</h1>\
                 <p>Check the terminal for details.</p></body></html>",
            ),
        };
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len(),
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;

        outcome
    };

    tokio::time::timeout(timeout, accept_future)
        .await
        .map_err(|_| {
            DaisyconError::OAuthError(format!(
                "Timed out waiting for OAuth callback after {}s",
                timeout.as_secs()
            ))
        })?
}

/// Extract the code from a raw `GET /callback?code=...&state=... HTTP/1.1` request.
fn parse_callback(request: &str, expected_state: &str) -> Result<String, DaisyconError> {
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| DaisyconError::OAuthError("Malformed callback request".to_string()))?;
    let query = target.split_once('?').map(|(_, q)| q).unwrap_or_default();

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(DaisyconError::OAuthError(format!(
            "Authorization server returned error: {error}"
        )));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(DaisyconError::OAuthError(
            "OAuth state mismatch in callback".to_string(),
        ));
    }
    code.ok_or_else(|| {
        DaisyconError::OAuthError("No authorization code found in callback request".to_string())
    })
}
