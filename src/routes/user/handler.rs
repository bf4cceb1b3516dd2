use axum::{
    Extension,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::{
    AppState,
    config::Config,
    error::AppError,
    middleware::SessionToken,
    services::{NicknameUpdate, UserProfile},
    utils::{ApiResponse, ok_to_api_response, success_to_api_response},
};

use super::model::{
    GetUserInfoQuery, LoginRequest, LoginResponse, LogoffRequest, RegisterRequest,
    UpdateNicknameRequest, UpdateNicknameResponse,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn bind_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::error!("bind request json err: {}", rejection.body_text());
            Err(AppError::BadRequestBody(rejection.body_text()))
        }
    }
}

/// 写入会话令牌的 cookie
fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(config.cookie_expire_secs))
        .build()
}

/// 过期时间设为过去，浏览器会删除该 cookie
fn expired_session_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.session_cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<()> {
    let req = bind_json(payload)?;
    state.accounts.register(req.into()).await?;
    Ok(ok_to_api_response())
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), AppError> {
    let req = bind_json(payload)?;
    let token = state.accounts.login(&req.username, &req.password).await?;

    let jar = jar.add(session_cookie(&state.config, token.clone()));
    Ok((
        jar,
        success_to_api_response(LoginResponse {
            username: req.username,
            token,
        }),
    ))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<()>>), AppError> {
    state.accounts.logout(&token).await?;
    Ok((jar.add(expired_session_cookie(&state.config)), ok_to_api_response()))
}

#[axum::debug_handler]
pub async fn logoff(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    jar: CookieJar,
    payload: Result<Json<LogoffRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<ApiResponse<()>>), AppError> {
    let req = bind_json(payload)?;
    state.accounts.deregister(&req.username, &token).await?;
    Ok((jar.add(expired_session_cookie(&state.config)), ok_to_api_response()))
}

#[axum::debug_handler]
pub async fn get_user_info(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    query: Result<Query<GetUserInfoQuery>, QueryRejection>,
) -> ApiResult<UserProfile> {
    let Query(query) = query.map_err(|e| AppError::BadRequestBody(e.body_text()))?;
    let profile = state.accounts.get_user_info(&query.username, &token).await?;
    Ok(success_to_api_response(profile))
}

#[axum::debug_handler]
pub async fn update_nick_name(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    payload: Result<Json<UpdateNicknameRequest>, JsonRejection>,
) -> ApiResult<UpdateNicknameResponse> {
    let req = bind_json(payload)?;
    let outcome = state
        .accounts
        .update_nickname(&req.username, &token, &req.new_nickname)
        .await?;

    Ok(success_to_api_response(UpdateNicknameResponse {
        updated: outcome == NicknameUpdate::Applied,
    }))
}
