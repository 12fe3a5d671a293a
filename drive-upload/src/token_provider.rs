use std::time::{Duration, Instant};

use gdrive_core::{AuthError, Credentials, TokenClient};

const REFRESH_SKEW: Duration = Duration::from_secs(60);

pub struct TokenProvider {
    credentials: Credentials,
    client: TokenClient,
    scope: String,
    cached: Option<CachedToken>,
    refresh_skew: Duration,
}

struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl TokenProvider {
    pub fn new(credentials: Credentials, scope: impl Into<String>) -> Self {
        Self {
            credentials,
            client: TokenClient::new(),
            scope: scope.into(),
            cached: None,
            refresh_skew: REFRESH_SKEW,
        }
    }

    /// Returns the cached access token, fetching a new one when none is cached
    /// or the cached one expires within the refresh skew.
    pub async fn valid_access_token(&mut self) -> Result<String, AuthError> {
        if let Some(cached) = self.cached.as_ref().filter(|c| self.is_fresh(c)) {
            return Ok(cached.access_token.clone());
        }
        let token = self
            .client
            .fetch_token(&self.credentials, &self.scope)
            .await?;
        tracing::debug!(expires_in = ?token.expires_in, "fetched access token");
        let expires_at = token
            .expires_in
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        let access_token = token.access_token;
        self.cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at,
        });
        Ok(access_token)
    }

    fn is_fresh(&self, cached: &CachedToken) -> bool {
        match cached.expires_at {
            Some(expires_at) => expires_at > Instant::now() + self.refresh_skew,
            None => true,
        }
    }
}
