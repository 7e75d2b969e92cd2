use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::Client;
use crate::error::DaisyconError;
use crate::oauth::{listen_for_callback, Handshake, TokenState};

/// Run the interactive authorization and store the resulting tokens.
///
/// Loopback redirect targets (`http://localhost:<port>/...`) are served by a
/// one-shot local listener; anything else falls back to pasting the code or
/// the full redirect URL on stdin.
pub async fn run_auth(cli_config: Option<&str>, timeout: Duration) -> Result<(), DaisyconError> {
    let client = Client::from_config(cli_config)?;
    let config = client.config();
    if config.client_id.is_empty() || config.redirect_uri.is_empty() {
        return Err(DaisyconError::ConfigError {
            path: "<config>".into(),
            detail: "clientId and redirectUri are required for authorization".to_string(),
        });
    }

    let tokens = client.tokens();
    let handshake = tokens.handshake()?;

    let code = match loopback_port(&handshake.redirect_uri) {
        Some(port) => {
            if webbrowser::open(&handshake.authorize_url).is_err() {
                tracing::warn!(
                    "Could not open browser automatically. Please visit:\n{}",
                    handshake.authorize_url
                );
            }
            eprintln!("Waiting for the authorization redirect on port {port}...");
            listen_for_callback(port, &handshake.state, timeout).await?
        }
        None => {
            println!("Open this URL in a browser and authorize access:\n");
            println!("  {}\n", handshake.authorize_url);
            println!("Then paste the code (or the full redirect URL) here:");
            let line = read_line().await?;
            extract_code(&line, &handshake)?
        }
    };

    let token = tokens.complete_handshake(&handshake, &code).await?;
    println!(
        "Authorization complete. Tokens saved to {}",
        tokens.store().path().display()
    );
    if let Some(exp) = token.expires_at() {
        println!("Access token expires: {exp}");
    }
    Ok(())
}

/// `daisycon token`: report the stored token without touching the network.
pub fn run_token_status(cli_config: Option<&str>) -> Result<(), DaisyconError> {
    let client = Client::from_config(cli_config)?;
    let tokens = client.tokens();
    let path = tokens.store().path().display().to_string();

    match tokens.store().load() {
        None => println!("No token stored at {path}. Run: daisycon auth"),
        Some(token) => {
            let state = match token.state() {
                TokenState::Valid => "valid",
                TokenState::ExpiringSoon => "expiring (will refresh on next call)",
                TokenState::Absent => "unreadable (run: daisycon auth)",
            };
            println!("Token file: {path}");
            println!("State: {state}");
            if let Some(exp) = token.expires_at() {
                println!("Expires: {exp}");
            }
        }
    }
    Ok(())
}

fn loopback_port(redirect_uri: &str) -> Option<u16> {
    let url = url::Url::parse(redirect_uri).ok()?;
    if url.scheme() != "http" {
        return None;
    }
    match url.host_str()? {
        "localhost" | "127.0.0.1" => url.port_or_known_default(),
        _ => None,
    }
}

/// Accept a bare code or a pasted redirect URL carrying `code` and `state`.
fn extract_code(input: &str, handshake: &Handshake) -> Result<String, DaisyconError> {
    let input = input.trim();
    let Ok(url) = url::Url::parse(input) else {
        if input.is_empty() {
            return Err(DaisyconError::OAuthError("No authorization code entered".to_string()));
        }
        return Ok(input.to_string());
    };

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(state) = state {
        if state != handshake.state {
            return Err(DaisyconError::OAuthError(
                "OAuth state mismatch in redirect URL".to_string(),
            ));
        }
    }
    code.filter(|c| !c.is_empty()).ok_or_else(|| {
        DaisyconError::OAuthError("Redirect URL has no authorization code".to_string())
    })
}

async fn read_line() -> Result<String, DaisyconError> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line)
}
