use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use daisycon::ClientConfig;
use wiremock::MockServer;

pub const TOKEN_PATH: &str = "/oauth/access-token";

/// Unsigned JWT whose `exp` lies `secs_from_now` seconds ahead.
pub fn jwt_expiring_in(secs_from_now: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + secs_from_now;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"aud":"test","exp":{exp}}}"#));
    format!("{header}.{payload}.signature")
}

/// Config pointing every endpoint at the mock server.
pub fn mock_config(server: &MockServer, dir: &Path) -> ClientConfig {
    ClientConfig {
        client_id: "test-client".into(),
        client_secret: "test-secret".into(),
        redirect_uri: "https://example.com/callback".into(),
        token_path: Some(dir.join("token.json")),
        base_url: Some(server.uri()),
        authorize_url: Some(format!("{}/oauth/authorize", server.uri())),
        token_url: Some(format!("{}{TOKEN_PATH}", server.uri())),
        timeout_ms: Some(5_000),
        ..Default::default()
    }
}

pub fn write_token(path: &Path, access_token: &str, refresh_token: Option<&str>) {
    let mut token = serde_json::json!({
        "access_token": access_token,
        "token_type": "Bearer",
    });
    if let Some(refresh) = refresh_token {
        token["refresh_token"] = serde_json::Value::String(refresh.to_string());
    }
    std::fs::write(path, serde_json::to_string_pretty(&token).unwrap()).unwrap();
}

#[allow(dead_code)]
pub fn read_token(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Write `config` as a JSON file inside `dir` and return its path.
#[allow(dead_code)]
pub fn write_config_file(dir: &Path, config: &ClientConfig) -> PathBuf {
    let path = dir.join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(config).unwrap()).unwrap();
    path
}
