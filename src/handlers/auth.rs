use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Router,
};

use crate::{
    auth::{
        AccessTokenResponse, AdminProfile, AuthAdmin, AuthError, LoginRequest, LoginResponse,
        RefreshTokenRequest, SetupAdminRequest,
    },
    handlers::common::{created_response, message_response, success_response, AppJson},
    ApiResponse, AppState,
};

/// Login, refresh and first-admin setup; reachable without a token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/setup", post(setup_admin))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

/// Session endpoints that require a valid access token
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Creates the first admin account
#[utoipa::path(
    post,
    path = "/api/admin/setup",
    request_body = SetupAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = ApiResponse<AdminProfile>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "An admin already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin Auth"
)]
pub async fn setup_admin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetupAdminRequest>,
) -> Result<Response, AuthError> {
    let admin = state.services.auth.setup_first_admin(payload).await?;
    Ok(created_response(admin, "Admin account created"))
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Response, AuthError> {
    let session = state.services.auth.login(payload).await?;
    Ok(success_response(session))
}

#[utoipa::path(
    post,
    path = "/api/admin/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = ApiResponse<AccessTokenResponse>),
        (status = 401, description = "Refresh token invalid, expired or revoked", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> Result<Response, AuthError> {
    let token = state.services.auth.refresh(&payload.refresh_token).await?;
    Ok(success_response(token))
}

/// Revokes the given refresh token
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    admin: AuthAdmin,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> Result<Response, AuthError> {
    state
        .services
        .auth
        .logout(admin.admin_id, &payload.refresh_token)
        .await?;
    Ok(message_response("Logged out"))
}

#[utoipa::path(
    get,
    path = "/api/admin/me",
    responses(
        (status = 200, description = "Current admin", body = ApiResponse<AdminProfile>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Auth"
)]
pub async fn me(State(state): State<AppState>, admin: AuthAdmin) -> Result<Response, AuthError> {
    let profile = state.services.auth.me(admin.admin_id).await?;
    Ok(success_response(profile))
}
