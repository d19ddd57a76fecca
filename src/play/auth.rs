use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, Result};

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// The fields of a Google service account key file we need.
#[derive(Deserialize, Clone)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

// Manual Debug impl to avoid leaking the private key
impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

fn default_token_uri() -> String {
    TOKEN_URL.to_string()
}

impl ServiceAccount {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read service account at {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_slice(&raw)
            .map_err(|e| AppError::Config(format!("Invalid service account JSON: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Sign the JWT bearer assertion exchanged for an access token.
pub fn build_assertion(account: &ServiceAccount, now: i64) -> Result<String> {
    let encoding_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
        .map_err(|e| AppError::Auth(format!("Invalid RSA private key: {e}")))?;

    let claims = JwtClaims {
        iss: &account.client_email,
        scope: SCOPE,
        aud: &account.token_uri,
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };

    let header = Header::new(Algorithm::RS256);
    Ok(encode(&header, &claims, &encoding_key)?)
}

/// Exchange a signed assertion for an Android Publisher access token.
pub async fn mint_access_token(http: &Client, account: &ServiceAccount) -> Result<String> {
    let assertion = build_assertion(account, chrono::Utc::now().timestamp())?;
    let form = format!(
        "grant_type={}&assertion={}",
        urlencoding::encode(GRANT_TYPE),
        urlencoding::encode(&assertion)
    );

    let response = http
        .post(&account.token_uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Auth(format!(
            "Failed to mint access token: HTTP {status}: {body}"
        )));
    }

    let token: TokenResponse = response.json().await?;
    tracing::debug!(client_email = %account.client_email, "Minted Play access token");
    Ok(token.access_token)
}
