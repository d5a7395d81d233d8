/**
 * Authentication Routes
 * JWT access tokens for the single CMS admin, with rotating refresh tokens
 */
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, net::SocketAddr};
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult, AppJson};

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

lazy_static::lazy_static! {
    /// JWT secret key from environment
    pub static ref JWT_SECRET: String = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

    /// The one account allowed into the CMS
    pub static ref ADMIN_EMAIL: String = std::env::var("ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@example.com".to_string());

    /// bcrypt hash of the admin password: ADMIN_PASSWORD_HASH, else ADMIN_PASSWORD
    /// hashed on first use, else "admin123".
    static ref ADMIN_PASSWORD_HASH: String = std::env::var("ADMIN_PASSWORD_HASH")
        .or_else(|_| {
            let plain = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
            hash(plain, DEFAULT_COST)
        })
        .unwrap_or_default();

    static ref REFRESH_TOKENS: RefreshTokenStore = RefreshTokenStore::new();

    static ref LOGIN_LIMITER: LoginLimiter = LoginLimiter::new(MAX_FAILED_LOGINS, FAILED_LOGIN_WINDOW_SECS);
}

const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;
const MAX_FAILED_LOGINS: u32 = 5;
const FAILED_LOGIN_WINDOW_SECS: i64 = 15 * 60;

const ADMIN_USER_ID: &str = "admin";
const ADMIN_ROLE: &str = "ADMIN";

// ============================================================================
// Types
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
struct RefreshTokenData {
    user_id: String,
    email: String,
    role: String,
    expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

impl From<Claims> for UserInfo {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub is_valid: bool,
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Failed login tracking
// ============================================================================

/// Counts failed logins per IP inside a sliding window.
pub struct LoginLimiter {
    max_failures: u32,
    window_secs: i64,
    failures: RwLock<HashMap<String, (u32, i64)>>,
}

impl LoginLimiter {
    pub fn new(max_failures: u32, window_secs: i64) -> Self {
        Self {
            max_failures,
            window_secs,
            failures: RwLock::new(HashMap::new()),
        }
    }

    pub async fn is_blocked(&self, ip: &str, now: i64) -> bool {
        let failures = self.failures.read().await;
        matches!(failures.get(ip), Some((count, first)) if now - first < self.window_secs && *count >= self.max_failures)
    }

    pub async fn record_failure(&self, ip: &str, now: i64) {
        let mut failures = self.failures.write().await;
        // Expired windows are dropped on every write so the map only holds active IPs.
        failures.retain(|_, (_, first)| now - *first < self.window_secs);
        failures
            .entry(ip.to_string())
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, now));
    }

    pub async fn reset(&self, ip: &str) {
        self.failures.write().await.remove(ip);
    }
}

// ============================================================================
// Refresh token store
// ============================================================================

/// Live refresh tokens keyed by SHA-256 digest. Used, revoked and expired
/// tokens are removed rather than flagged, so the map only holds usable ones.
pub struct RefreshTokenStore {
    tokens: RwLock<HashMap<String, RefreshTokenData>>,
}

impl RefreshTokenStore {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    async fn insert(&self, token_hash: String, data: RefreshTokenData) {
        let now = Utc::now().timestamp();
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, d| d.expires_at > now);
        tokens.insert(token_hash, data);
    }

    /// Remove and return the entry if it is still live (single use).
    async fn take(&self, token_hash: &str, now: i64) -> Option<RefreshTokenData> {
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, d| d.expires_at > now);
        tokens.remove(token_hash)
    }

    async fn revoke(&self, token_hash: &str) {
        self.tokens.write().await.remove(token_hash);
    }

    async fn revoke_user(&self, user_id: &str) {
        self.tokens
            .write()
            .await
            .retain(|_, d| d.user_id != user_id);
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

impl Default for RefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn generate_refresh_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}

/// Refresh tokens are only ever stored by their SHA-256 digest.
fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub(crate) fn create_access_token(user_id: &str, email: &str, role: &str) -> ApiResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp: (now + Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to create token: {}", e)))
}

pub fn verify_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

async fn check_credentials(email: &str, password: String) -> bool {
    credentials_match(email, password, &ADMIN_EMAIL, ADMIN_PASSWORD_HASH.clone()).await
}

/// The bcrypt check runs for every attempt so a wrong email costs as much as
/// a wrong password.
async fn credentials_match(
    email: &str,
    password: String,
    admin_email: &str,
    admin_hash: String,
) -> bool {
    let email_matches = email.to_lowercase() == admin_email.to_lowercase();
    // bcrypt is CPU-bound; keep it off the async workers.
    let password_matches =
        tokio::task::spawn_blocking(move || verify(password, &admin_hash).unwrap_or(false))
            .await
            .unwrap_or(false);
    email_matches && password_matches
}

async fn issue_tokens(
    store: &RefreshTokenStore,
    user_id: &str,
    email: &str,
    role: &str,
) -> ApiResult<(String, String)> {
    let access_token = create_access_token(user_id, email, role)?;
    let refresh_token = generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS);

    store
        .insert(
            hash_refresh_token(&refresh_token),
            RefreshTokenData {
                user_id: user_id.to_string(),
                email: email.to_string(),
                role: role.to_string(),
                expires_at: expires_at.timestamp(),
            },
        )
        .await;

    Ok((access_token, refresh_token))
}

/// Spend `refresh_token` and hand out a fresh pair in its place.
async fn rotate_tokens(
    store: &RefreshTokenStore,
    refresh_token: &str,
) -> ApiResult<(String, String)> {
    let data = store
        .take(&hash_refresh_token(refresh_token), Utc::now().timestamp())
        .await
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    issue_tokens(store, &data.user_id, &data.email, &data.role).await
}

// ============================================================================
// Extractor
// ============================================================================

/// Authenticated CMS operator, taken from `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authorization required".to_string()))?;

        verify_access_token(&token).map(AdminUser).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    AppJson(payload): AppJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let ip = addr.ip().to_string();

    if LOGIN_LIMITER.is_blocked(&ip, Utc::now().timestamp()).await {
        tracing::warn!(ip = %ip, "login blocked after repeated failures");
        return Err(ApiError::RateLimited);
    }

    let email = payload.email.trim().to_string();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }
    if !email.contains('@') {
        return Err(ApiError::validation("Invalid email format"));
    }

    if !check_credentials(&email, payload.password).await {
        LOGIN_LIMITER
            .record_failure(&ip, Utc::now().timestamp())
            .await;
        tracing::warn!(ip = %ip, "Failed login attempt for: {}", email);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }
    LOGIN_LIMITER.reset(&ip).await;

    let (access_token, refresh_token) =
        issue_tokens(&REFRESH_TOKENS, ADMIN_USER_ID, &email, ADMIN_ROLE).await?;

    tracing::info!("Successful login for user: {}", email);

    Ok(Json(TokenResponse {
        success: true,
        user: Some(UserInfo {
            user_id: ADMIN_USER_ID.to_string(),
            email,
            role: ADMIN_ROLE.to_string(),
        }),
        access_token,
        refresh_token,
    }))
}

/// POST /api/auth/verify
/// Always 200; validity is reported in the body.
pub async fn verify_token(headers: HeaderMap) -> Json<VerifyResponse> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Json(VerifyResponse {
            success: false,
            is_valid: false,
            user: None,
            error: Some("No authorization token provided".to_string()),
        });
    };

    match verify_access_token(&token) {
        Ok(claims) => Json(VerifyResponse {
            success: true,
            is_valid: true,
            user: Some(claims.into()),
            error: None,
        }),
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            Json(VerifyResponse {
                success: false,
                is_valid: false,
                user: None,
                error: Some("Invalid or expired token".to_string()),
            })
        }
    }
}

/// POST /api/auth/refresh
/// Trades a live refresh token for a new access token and a rotated refresh token.
pub async fn refresh(AppJson(payload): AppJson<RefreshRequest>) -> ApiResult<Json<TokenResponse>> {
    if payload.refresh_token.trim().is_empty() {
        return Err(ApiError::validation("Refresh token is required"));
    }

    let (access_token, refresh_token) =
        rotate_tokens(&REFRESH_TOKENS, &payload.refresh_token).await?;

    Ok(Json(TokenResponse {
        success: true,
        user: None,
        access_token,
        refresh_token,
    }))
}

/// POST /api/auth/logout
/// Idempotent: revokes what it can and always reports success.
pub async fn logout(headers: HeaderMap, AppJson(payload): AppJson<LogoutRequest>) -> Json<LogoutResponse> {
    if let Some(refresh_token) = payload.refresh_token {
        REFRESH_TOKENS.revoke(&hash_refresh_token(&refresh_token)).await;
    }

    let access_token = payload
        .access_token
        .or_else(|| extract_bearer_token(&headers));
    if let Some(claims) = access_token.and_then(|t| verify_access_token(&t).ok()) {
        REFRESH_TOKENS.revoke_user(&claims.sub).await;
    }

    Json(LogoutResponse { success: true })
}
