//! Authentication middleware
//!
//! Extracts and validates the bearer token, then makes the decoded claims
//! available to handlers through request extensions.

use crate::auth::decode_token;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use tracing::warn;

/// Verify the request's bearer token and stash claims for handlers.
///
/// Missing vs. malformed headers are distinguished in the logs only; the
/// client sees one generic 401 either way.
pub async fn auth_middleware(
    State(state): State<SharedState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(TypedHeader(auth)) = bearer else {
        if request.headers().contains_key(AUTHORIZATION) {
            warn!("Rejected request: malformed authorization header");
        } else {
            warn!("Rejected request: missing authorization header");
        }
        return Err(AppError::Unauthorized(
            "Authentication required".to_string(),
        ));
    };

    let claims = decode_token(auth.token(), &state.auth)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
