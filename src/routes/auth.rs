//! Authentication route handlers
//!
//! Register, login, current-user, and logout endpoints.

use crate::auth::{auth_middleware, create_token, hash_password, verify_password, Claims, Role};
use crate::db::users::UserRecord;
use crate::error::{ApiResult, AppError};
use crate::models::{DataResponse, SuccessResponse};
use crate::state::SharedState;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserSummary {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

/// POST /api/auth/register
///
/// Create an account. The role defaults to `public`; unknown role strings
/// are rejected up front.
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<UserSummary>>)> {
    req.validate()?;

    let role = match req.role.as_deref() {
        None | Some("") => Role::Public,
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Validation("Invalid role".to_string()))?,
    };

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state.users.create(&req.email, &password_hash, role).await?;

    info!("Registered user {} ({})", user.email, user.role);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "User registered successfully",
            UserSummary::from(user),
        )),
    ))
}

/// POST /api/auth/login
///
/// Verify credentials and issue a bearer token. Unknown email and wrong
/// password produce the same message so accounts cannot be enumerated.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SuccessResponse<serde_json::Value>>> {
    req.validate()?;

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = create_token(user.id, &user.email, user.role, &state.auth)?;

    Ok(Json(SuccessResponse::with_data(
        "Login successful",
        json!({
            "token": token,
            "user": UserSummary::from(user),
        }),
    )))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<DataResponse<UserSummary>>> {
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(DataResponse::new(UserSummary::from(user))))
}

/// POST /api/auth/logout
///
/// Token invalidation is the client's job; the server keeps no session
/// state and no revocation list.
pub async fn logout() -> Json<SuccessResponse<()>> {
    Json(SuccessResponse::message_only(
        "Logout successful. Please remove the token from client storage.",
    ))
}
