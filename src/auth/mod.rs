/*!
 * # Admin Authentication
 *
 * Admin accounts sign in with email and password (argon2 hashes) and receive a
 * short-lived HS256 access token plus a refresh token. Refresh tokens are JWTs
 * signed with a separate secret and are only honoured while their row exists in
 * `refresh_tokens`, so logout revokes them immediately.
 */

use crate::{
    config::AppConfig,
    entities::{admin, refresh_token},
    errors::{ErrorResponse, ServiceError},
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub mod password;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Admin ID
    pub email: String,
    pub name: String,
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub token_type: TokenType,
}

/// Admin identity attached to authenticated requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthAdmin {
    pub admin_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub token_id: String,
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub jwt_issuer: String,
    pub access_token_ttl: ChronoDuration,
    pub refresh_token_ttl: ChronoDuration,
}

impl From<&AppConfig> for AuthConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            jwt_refresh_secret: config.jwt_refresh_secret.clone(),
            jwt_issuer: config.jwt_issuer.clone(),
            access_token_ttl: ChronoDuration::seconds(
                i64::try_from(config.access_token_ttl_secs).unwrap_or(i64::MAX / 1000),
            ),
            refresh_token_ttl: ChronoDuration::seconds(
                i64::try_from(config.refresh_token_ttl_secs).unwrap_or(i64::MAX / 1000),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetupAdminRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<admin::Model> for AdminProfile {
    fn from(model: admin::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: ADMIN_ROLE.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub admin: AdminProfile,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Authentication service that handles admin accounts and token issuance
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Creates the first admin account. Refused once any admin exists.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn setup_first_admin(
        &self,
        request: SetupAdminRequest,
    ) -> Result<AdminProfile, AuthError> {
        request.validate().map_err(ServiceError::from)?;
        let db = &*self.db;

        let existing = admin::Entity::find()
            .count(db)
            .await
            .map_err(ServiceError::from)?;
        if existing > 0 {
            warn!("Admin setup attempted after an admin already exists");
            return Err(AuthError::AdminExists);
        }

        let password_hash = password::hash_password(&request.password)
            .map_err(|e| AuthError::InternalError(format!("Password hashing failed: {}", e)))?;
        let model = admin::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email.trim().to_lowercase()),
            password_hash: Set(password_hash),
            name: Set(request.name.trim().to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::from)?;

        info!(admin_id = %model.id, "First admin created");
        Ok(model.into())
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        request.validate().map_err(ServiceError::from)?;

        let admin = admin::Entity::find()
            .filter(admin::Column::Email.eq(request.email.trim().to_lowercase()))
            .one(&*self.db)
            .await
            .map_err(ServiceError::from)?;

        // Same error for unknown email and wrong password
        let admin = match admin {
            Some(admin) if password::verify_password(&request.password, &admin.password_hash) => {
                admin
            }
            _ => {
                warn!("Failed admin login");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let access_token = self.issue_token(&admin, TokenType::Access)?;
        let refresh_token = self.issue_refresh_token(&admin).await?;
        info!(admin_id = %admin.id, "Admin logged in");

        Ok(LoginResponse {
            admin: admin.into(),
            tokens: TokenPair {
                access_token,
                refresh_token,
                token_type: "Bearer".to_string(),
                expires_in: self.config.access_token_ttl.num_seconds(),
                refresh_expires_in: self.config.refresh_token_ttl.num_seconds(),
            },
        })
    }

    /// Exchanges a stored refresh token for a new access token
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessTokenResponse, AuthError> {
        let claims = self.decode(refresh_token, TokenType::Refresh)?;
        let db = &*self.db;

        let stored = refresh_token::Entity::find()
            .filter(refresh_token::Column::Token.eq(refresh_token))
            .one(db)
            .await
            .map_err(ServiceError::from)?
            .ok_or(AuthError::RevokedToken)?;
        if stored.is_expired() {
            debug!(token_id = %stored.id, "Removing expired refresh token");
            stored.delete(db).await.map_err(ServiceError::from)?;
            return Err(AuthError::TokenExpired);
        }

        let admin_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        if admin_id != stored.admin_id {
            return Err(AuthError::InvalidToken);
        }
        let admin = self.find_admin(admin_id).await?;

        Ok(AccessTokenResponse {
            access_token: self.issue_token(&admin, TokenType::Access)?,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_ttl.num_seconds(),
        })
    }

    /// Revokes a refresh token belonging to the admin. Unknown tokens are ignored.
    #[instrument(skip(self, refresh_token), fields(admin_id = %admin_id))]
    pub async fn logout(&self, admin_id: Uuid, refresh_token: &str) -> Result<(), AuthError> {
        let result = refresh_token::Entity::delete_many()
            .filter(refresh_token::Column::Token.eq(refresh_token))
            .filter(refresh_token::Column::AdminId.eq(admin_id))
            .exec(&*self.db)
            .await
            .map_err(ServiceError::from)?;
        info!(revoked = result.rows_affected, "Admin logged out");
        Ok(())
    }

    pub async fn me(&self, admin_id: Uuid) -> Result<AdminProfile, AuthError> {
        Ok(self.find_admin(admin_id).await?.into())
    }

    /// Validates a Bearer access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode(token, TokenType::Access)
    }

    async fn find_admin(&self, admin_id: Uuid) -> Result<admin::Model, AuthError> {
        admin::Entity::find_by_id(admin_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::from)?
            .ok_or(AuthError::AdminNotFound)
    }

    async fn issue_refresh_token(&self, admin: &admin::Model) -> Result<String, AuthError> {
        let token = self.issue_token(admin, TokenType::Refresh)?;
        refresh_token::ActiveModel {
            id: Set(Uuid::new_v4()),
            admin_id: Set(admin.id),
            token: Set(token.clone()),
            expires_at: Set(Utc::now() + self.config.refresh_token_ttl),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .map_err(ServiceError::from)?;
        Ok(token)
    }

    fn secret(&self, token_type: TokenType) -> &[u8] {
        match token_type {
            TokenType::Access => self.config.jwt_secret.as_bytes(),
            TokenType::Refresh => self.config.jwt_refresh_secret.as_bytes(),
        }
    }

    fn issue_token(&self, admin: &admin::Model, token_type: TokenType) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.config.access_token_ttl,
            TokenType::Refresh => self.config.refresh_token_ttl,
        };
        let claims = Claims {
            sub: admin.id.to_string(),
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: ADMIN_ROLE.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.config.jwt_issuer.clone(),
            token_type,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret(token_type)),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.validate_nbf = true;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(expected)),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if claims.token_type != expected {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("An admin account already exists")]
    AdminExists,

    #[error("Admin not found")]
    AdminNotFound,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Service(inner) => return inner.into_response(),
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING_TOKEN",
                "No authentication token provided",
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials",
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token",
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired",
            ),
            Self::RevokedToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REVOKED_TOKEN",
                "Token has been revoked",
            ),
            Self::AdminExists => (
                StatusCode::CONFLICT,
                "AUTH_ADMIN_EXISTS",
                "An admin account already exists",
            ),
            Self::AdminNotFound => (
                StatusCode::UNAUTHORIZED,
                "AUTH_ADMIN_NOT_FOUND",
                "Admin account no longer exists",
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions",
            ),
            Self::TokenCreation(msg) | Self::InternalError(msg) => {
                error!(error = %msg, "authentication failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AUTH_INTERNAL_ERROR",
                    "Internal server error",
                )
            }
        };

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.to_string(),
            details: Some(code.to_string()),
            fields: None,
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Validates the Bearer access token and attaches [`AuthAdmin`] to the request
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let claims = auth_service.validate_access_token(token)?;
    if claims.role != ADMIN_ROLE {
        return Err(AuthError::InsufficientPermissions);
    }

    let admin = AuthAdmin {
        admin_id: Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?,
        email: claims.email,
        name: claims.name,
        role: claims.role,
        token_id: claims.jti,
    };
    request.extensions_mut().insert(admin);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthAdmin>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self, auth_service: Arc<AuthService>) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self, auth_service: Arc<AuthService>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            auth_service,
            auth_middleware,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> AuthService {
        AuthService::new(
            AuthConfig {
                jwt_secret: "access-secret-for-tests-0123456789abcdef".into(),
                jwt_refresh_secret: "refresh-secret-for-tests-0123456789abcdef".into(),
                jwt_issuer: "silver-jewelry-api".into(),
                access_token_ttl: ChronoDuration::minutes(15),
                refresh_token_ttl: ChronoDuration::days(7),
            },
            Arc::new(DatabaseConnection::Disconnected),
        )
    }

    fn admin() -> admin::Model {
        admin::Model {
            id: Uuid::new_v4(),
            email: "owner@example.com".into(),
            password_hash: String::new(),
            name: "Owner".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let auth = service();
        let admin = admin();
        let token = auth.issue_token(&admin, TokenType::Access).unwrap();

        let claims = auth.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, admin.id.to_string());
        assert_eq!(claims.role, ADMIN_ROLE);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let auth = service();
        let token = auth.issue_token(&admin(), TokenType::Refresh).unwrap();
        assert_matches!(auth.validate_access_token(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expired_access_token_is_reported_as_expired() {
        let mut auth = service();
        auth.config.access_token_ttl = ChronoDuration::minutes(-10);
        let token = auth.issue_token(&admin(), TokenType::Access).unwrap();
        assert_matches!(auth.validate_access_token(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn admin_exists_maps_to_conflict() {
        let response = AuthError::AdminExists.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
