//! HTTP client for the Precisely cloud APIs.
//!
//! Requests carry a bearer token obtained from the token-exchange endpoint
//! (Basic auth with key/secret). The token is cached inside the client and
//! refreshed shortly before expiry; a 401 invalidates the cache and the
//! request is retried once with a fresh token.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

pub const PRECISELY_BASE_URL: &str = "https://api.cloud.precisely.com";
const TOKEN_PATH: &str = "/oauth/token";
const TIMEOUT_SECS: u64 = 15;
/// Refresh this long before the token actually expires.
const TOKEN_REFRESH_MARGIN_SECS: u64 = 60;

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + Duration::from_secs(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

pub struct PreciselyClient {
    http: Client,
    api_key: SecretString,
    api_secret: SecretString,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl PreciselyClient {
    pub fn new(api_key: SecretString, api_secret: SecretString) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .expect("failed to build reqwest client");
        Self { http, api_key, api_secret, base_url: PRECISELY_BASE_URL.to_string(), token: Mutex::new(None) }
    }

    /// Get a bearer token, exchanging credentials only when the cached one is
    /// missing or about to expire.
    fn bearer_token(&self) -> Result<String, String> {
        let mut guard = self.token.lock().map_err(|_| "token cache poisoned".to_string())?;
        if let Some(cached) = guard.as_ref()
            && cached.is_fresh(Instant::now())
        {
            return Ok(cached.access_token.clone());
        }

        let resp = self
            .http
            .post(format!("{}{}", self.base_url, TOKEN_PATH))
            .basic_auth(self.api_key.expose_secret(), Some(self.api_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .map_err(|e| format!("Token exchange failed: {}", e))?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| format!("Failed to read token response: {}", e))?;
        if !(200..300).contains(&status) {
            return Err(format!("Token exchange HTTP {}: {}", status, truncate(&body, 200)));
        }

        let json: Value =
            serde_json::from_str(&body).map_err(|e| format!("Malformed token response: {}", e))?;
        let access_token = json
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Token response missing access_token".to_string())?
            .to_string();
        // expiresIn arrives as a number or a numeric string depending on plan
        let ttl_secs = json
            .get("expiresIn")
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(3600);

        let token = CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        *guard = Some(token);
        Ok(access_token)
    }

    fn invalidate_token(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
    }

    /// POST a JSON body to an API path.
    pub fn post(&self, path: &str, body: &Value) -> Result<Value, String> {
        self.request_with_retry(|token| {
            self.http
                .post(format!("{}{}", self.base_url, path))
                .bearer_auth(token)
                .header("Content-Type", "application/json")
                .json(body)
                .send()
        })
    }

    /// GET an API path with query parameters.
    pub fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, String> {
        self.request_with_retry(|token| {
            self.http
                .get(format!("{}{}", self.base_url, path))
                .bearer_auth(token)
                .query(params)
                .send()
        })
    }

    /// Send with one 401-driven token refresh and a short 5xx retry.
    fn request_with_retry<F>(&self, send: F) -> Result<Value, String>
    where
        F: Fn(&str) -> reqwest::Result<reqwest::blocking::Response>,
    {
        let mut refreshed_auth = false;
        for attempt in 0..3 {
            let token = self.bearer_token()?;
            let resp = send(&token).map_err(|e| format!("Request failed: {}", e))?;
            let status = resp.status().as_u16();
            let body = resp.text().map_err(|e| format!("Failed to read response: {}", e))?;

            match status {
                200..=299 => {
                    return serde_json::from_str(&body)
                        .map_err(|e| format!("Malformed response: {}", e));
                }
                401 if !refreshed_auth => {
                    // Token may have been revoked early; exchange a new one.
                    self.invalidate_token();
                    refreshed_auth = true;
                    continue;
                }
                401 | 403 => {
                    return Err(format!(
                        "Auth error (HTTP {}). Check PRECISELY_API_KEY/SECRET. {}",
                        status,
                        truncate(&body, 200)
                    ));
                }
                429 => {
                    return Err(format!("Rate limited (429). {}", truncate(&body, 200)));
                }
                500..=599 if attempt < 2 => {
                    std::thread::sleep(Duration::from_secs(1));
                    continue;
                }
                _ => {
                    return Err(format!("HTTP {} error: {}", status, truncate(&body, 200)));
                }
            }
        }
        Err("Max retries exceeded".to_string())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_near_expiry_is_not_fresh() {
        let now = Instant::now();
        let token = CachedToken {
            access_token: "abc".to_string(),
            expires_at: now + Duration::from_secs(TOKEN_REFRESH_MARGIN_SECS / 2),
        };
        assert!(!token.is_fresh(now));
    }

    #[test]
    fn token_with_margin_left_is_fresh() {
        let now = Instant::now();
        let token = CachedToken {
            access_token: "abc".to_string(),
            expires_at: now + Duration::from_secs(TOKEN_REFRESH_MARGIN_SECS * 10),
        };
        assert!(token.is_fresh(now));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
