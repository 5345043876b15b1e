//! GoTrue auth endpoints.
//!
//! Covers the slice of Supabase auth the app uses: password sign-in,
//! token refresh, sign-out and fetching the current user. Session expiry
//! falls back to the JWT `exp` claim when the endpoint omits
//! `expires_at`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::session::{Session, User};
use crate::error::{AthenoError, AthenoResult, AuthError};
use crate::traits::{Headers, HttpClient};

/// Response from the token endpoints (password and refresh grants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

/// JWT claims for extracting expiration time.
#[derive(Deserialize)]
struct JwtClaims {
    exp: i64,
}

/// Extract the expiration time (Unix seconds) from a JWT access token.
///
/// Returns `None` if the token cannot be parsed.
pub fn jwt_expires_at(access_token: &str) -> Option<i64> {
    let parts: Vec<&str> = access_token.split('.').collect();
    let payload = URL_SAFE_NO_PAD.decode(parts.get(1)?).ok()?;
    let claims: JwtClaims = serde_json::from_slice(&payload).ok()?;
    Some(claims.exp)
}

/// Client for the GoTrue auth endpoints.
#[derive(Clone)]
pub struct AuthApi {
    base_url: String,
    anon_key: String,
    http: Arc<dyn HttpClient>,
}

impl AuthApi {
    /// Create a new auth API client.
    pub fn new(base_url: &str, anon_key: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            http,
        }
    }

    fn headers(&self, bearer: Option<&str>) -> Headers {
        let mut headers = Headers::new();
        headers.insert("apikey".to_string(), self.anon_key.clone());
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", bearer.unwrap_or(&self.anon_key)),
        );
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    fn session_from(response: TokenResponse) -> AthenoResult<Session> {
        let expires_at = response
            .expires_at
            .or_else(|| {
                response
                    .expires_in
                    .map(|secs| chrono::Utc::now().timestamp() + secs)
            })
            .or_else(|| jwt_expires_at(&response.access_token))
            .ok_or_else(|| {
                AthenoError::Auth(AuthError::MalformedSession {
                    message: "no expiry in token response".to_string(),
                })
            })?;

        Ok(Session {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            user: response.user,
        })
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AthenoResult<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let body = serde_json::json!({ "email": email, "password": password }).to_string();

        let response = self.http.post(&url, &body, &self.headers(None)).await?;
        if response.status == 400 || response.status == 401 {
            return Err(AuthError::InvalidCredentials.into());
        }
        if !response.is_success() {
            return Err(super::SupabaseClient::error_from_response(&response).into());
        }

        let token: TokenResponse = response.json().map_err(|err| {
            AthenoError::Auth(AuthError::MalformedSession {
                message: err.to_string(),
            })
        })?;
        Self::session_from(token)
    }

    /// Exchange a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> AthenoResult<Session> {
        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.base_url);
        let body = serde_json::json!({ "refresh_token": refresh_token }).to_string();

        let response = self.http.post(&url, &body, &self.headers(None)).await?;
        if !response.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(AuthError::RefreshFailed { message }.into());
        }

        let token: TokenResponse = response.json().map_err(|err| {
            AthenoError::Auth(AuthError::MalformedSession {
                message: err.to_string(),
            })
        })?;
        Self::session_from(token)
    }

    /// Fetch the user the access token belongs to.
    pub async fn get_user(&self, access_token: &str) -> AthenoResult<User> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self.http.get(&url, &self.headers(Some(access_token))).await?;
        if !response.is_success() {
            return Err(super::SupabaseClient::error_from_response(&response).into());
        }
        response.json().map_err(AthenoError::from)
    }

    /// Revoke the session server-side.
    pub async fn sign_out(&self, access_token: &str) -> AthenoResult<()> {
        let url = format!("{}/auth/v1/logout", self.base_url);

        let response = self
            .http
            .post(&url, "", &self.headers(Some(access_token)))
            .await?;
        if !response.is_success() {
            return Err(super::SupabaseClient::error_from_response(&response).into());
        }
        Ok(())
    }
}
