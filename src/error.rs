use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::cache::CacheError;
use crate::database::StoreError;
use crate::utils::{error_codes, error_to_api_response};

/// 服务层和 HTTP 边界共用的错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("请求体解析失败: {0}")]
    BadRequestBody(String),
    #[error("请求参数不合法: {0}")]
    InvalidParams(String),
    #[error("用户已经注册: {0}")]
    AlreadyRegistered(String),
    #[error("用户尚未注册: {0}")]
    NotRegistered(String),
    #[error("密码不正确")]
    PasswordMismatch,
    #[error("用户未登录")]
    NotLoggedIn,
    #[error("数据库错误: {0}")]
    Store(#[from] StoreError),
    #[error("缓存错误: {0}")]
    Cache(#[from] CacheError),
    #[error("未授权访问")]
    Unauthorized,
}

impl AppError {
    pub fn code(&self) -> i32 {
        match self {
            AppError::BadRequestBody(_) => error_codes::BODY_BIND_ERROR,
            AppError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            AppError::AlreadyRegistered(_) => error_codes::ALREADY_REGISTERED,
            AppError::NotRegistered(_) => error_codes::NOT_REGISTERED,
            AppError::PasswordMismatch => error_codes::PASSWORD_MISMATCH,
            AppError::NotLoggedIn => error_codes::NOT_LOGGED_IN,
            AppError::Store(_) => error_codes::STORE_ERROR,
            AppError::Cache(_) => error_codes::CACHE_ERROR,
            AppError::Unauthorized => error_codes::UNAUTHORIZED,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequestBody(_) | AppError::InvalidParams(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyRegistered(_)
            | AppError::NotRegistered(_)
            | AppError::PasswordMismatch => StatusCode::OK,
            AppError::NotLoggedIn | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Store(_) | AppError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = error_to_api_response::<()>(self.code(), self.to_string());
        (self.status(), body).into_response()
    }
}
