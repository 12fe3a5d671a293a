use std::fmt;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid token uri: {0}")]
    Url(#[from] url::ParseError),
    #[error("token endpoint returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("credentials are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported credentials type: '{0}'")]
    UnsupportedType(String),
    #[error("signing token assertion failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Google credentials JSON, either a service account key or an authorized user.
#[derive(Debug, Clone)]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

impl Credentials {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        #[derive(Deserialize)]
        struct Kind {
            #[serde(rename = "type", default)]
            kind: String,
        }

        let Kind { kind } = serde_json::from_str(json)?;
        match kind.as_str() {
            "service_account" => Ok(Self::ServiceAccount(serde_json::from_str(json)?)),
            "authorized_user" => Ok(Self::AuthorizedUser(serde_json::from_str(json)?)),
            other => Err(AuthError::UnsupportedType(other.to_string())),
        }
    }

    /// Values that must never be printed: keys, client secrets and refresh tokens.
    pub fn secret_values(&self) -> Vec<&str> {
        match self {
            Self::ServiceAccount(key) => {
                let mut values = vec![key.private_key.as_str()];
                values.extend(key.private_key_id.as_deref());
                values
            }
            Self::AuthorizedUser(user) => {
                vec![user.client_secret.as_str(), user.refresh_token.as_str()]
            }
        }
    }

    pub fn token_uri(&self) -> &str {
        match self {
            Self::ServiceAccount(key) => &key.token_uri,
            Self::AuthorizedUser(user) => &user.token_uri,
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Signs an RS256 JWT bearer assertion for `scope`, valid for one hour from `issued_at`.
    pub fn assertion(&self, scope: &str, issued_at: u64) -> Result<String, AuthError> {
        #[derive(Serialize)]
        struct Claims<'a> {
            iss: &'a str,
            scope: &'a str,
            aud: &'a str,
            iat: u64,
            exp: u64,
        }

        let claims = Claims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Clone, Default)]
pub struct TokenClient {
    http: Client,
}

impl TokenClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch_token(
        &self,
        credentials: &Credentials,
        scope: &str,
    ) -> Result<OAuthToken, AuthError> {
        match credentials {
            Credentials::ServiceAccount(key) => {
                let assertion = key.assertion(scope, now_unix())?;
                self.exchange_assertion(&key.token_uri, &assertion).await
            }
            Credentials::AuthorizedUser(user) => self.refresh_token(user).await,
        }
    }

    pub async fn exchange_assertion(
        &self,
        token_uri: &str,
        assertion: &str,
    ) -> Result<OAuthToken, AuthError> {
        let form = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)];
        self.post_form(token_uri, &form).await
    }

    pub async fn refresh_token(&self, user: &AuthorizedUser) -> Result<OAuthToken, AuthError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", user.refresh_token.as_str()),
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
        ];
        self.post_form(&user.token_uri, &form).await
    }

    async fn post_form(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<OAuthToken, AuthError> {
        let url = Url::parse(token_uri)?;
        let response = self.http.post(url).form(form).send().await?;
        if response.status().is_success() {
            Ok(response.json::<OAuthToken>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::Api { status, body })
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

fn now_unix() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
