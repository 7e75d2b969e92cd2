use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// A PKCE verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let code_verifier = random_token(64);
        let code_challenge = challenge_for(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
        }
    }
}

/// S256 challenge: base64url(sha256(verifier)) without padding.
pub fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Random base64url string from `len` bytes of entropy.
pub fn random_token(len: usize) -> String {
    let mut buf = vec![0u8; len];
    rand::Rng::fill_bytes(&mut rand::rng(), &mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
