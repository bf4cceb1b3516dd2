use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{AppState, error::AppError};

/// 备用的令牌请求头，供不使用 cookie 的客户端
pub const SESSION_HEADER: &str = "x-session-token";

/// 请求携带的会话令牌，由认证中间件放入请求扩展
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// 认证中间件
///
/// 只检查令牌是否存在且非空，不查询会话缓存；
/// 令牌是否有效由账户服务在处理请求时判断。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match extract_token(req.headers(), &state.config.session_cookie_name) {
        Some(token) => {
            req.extensions_mut().insert(SessionToken(token));
            Ok(next.run(req).await)
        }
        None => {
            tracing::warn!("Rejected request to {} without session", req.uri().path());
            Err(AppError::Unauthorized)
        }
    }
}

/// 先读 cookie，再读请求头
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(String::from)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::COOKIE};

    #[test]
    fn token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; user_session=abc"));
        assert_eq!(extract_token(&headers, "user_session").as_deref(), Some("abc"));
    }

    #[test]
    fn token_from_header_when_cookie_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static(" abc "));
        assert_eq!(extract_token(&headers, "user_session").as_deref(), Some("abc"));
    }

    #[test]
    fn empty_cookie_is_not_a_token() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("user_session="));
        assert_eq!(extract_token(&headers, "user_session"), None);
        assert_eq!(extract_token(&HeaderMap::new(), "user_session"), None);
    }
}
