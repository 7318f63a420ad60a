use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{
        Extension,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
};

use stockroom_auth::{AccessToken, LoginForm, PublicProfile, Registration};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicProfile>), ApiError> {
    let Json(input) = body?;
    let profile = services.accounts.register(input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// OAuth2 password-style login: form-encoded `username` and `password`.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<AccessToken>, ApiError> {
    let Form(form) = form?;
    Ok(Json(services.accounts.login(form).await?))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<PublicProfile>, ApiError> {
    services
        .accounts
        .profile(caller.account_id())
        .await?
        .map(Json)
        .ok_or(ApiError::AccountNotFound)
}
