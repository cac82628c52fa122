// Registration gate: sign-up is only open while no account exists.
//
// The check and the insert are not atomic. Two first registrations racing
// each other can both pass; the unique e-mail constraint still holds.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::database::UserStore;
use crate::error::ApiError;

pub const SIGN_UP_SUFFIX: &str = "/sign-up/email";
pub const REGISTRATION_DISABLED: &str = "Registration is disabled: an account already exists.";
pub const USER_CHECK_FAILED: &str = "Failed to check users";

/// Whether a request is an account-creation attempt
pub fn is_sign_up(method: &Method, path: &str) -> bool {
    method == Method::POST && path.ends_with(SIGN_UP_SUFFIX)
}

/// Middleware for the auth sub-API. Everything except sign-up passes through.
pub async fn registration_gate(
    State(users): State<Arc<dyn UserStore>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_sign_up(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    match users.has_users().await {
        Ok(true) => {
            info!("sign-up rejected, an account already exists");
            ApiError::forbidden(REGISTRATION_DISABLED).into_response()
        }
        Ok(false) => next.run(request).await,
        Err(e) => {
            error!("user existence check failed: {}", e);
            ApiError::internal_server_error(USER_CHECK_FAILED).into_response()
        }
    }
}
