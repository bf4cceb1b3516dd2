use axum::Json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::TokenMode;

/// 通用的API响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 错误码，0表示成功，非0表示失败
    pub code: i32,
    /// 错误消息，成功时为"success"
    pub msg: String,
    /// 响应数据，错误时为None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        data: Some(data),
    })
}

/// 无数据的成功响应
pub fn ok_to_api_response() -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        data: None,
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const BODY_BIND_ERROR: i32 = 10001;
    pub const INVALID_PARAMS: i32 = 10002;
    pub const ALREADY_REGISTERED: i32 = 10003;
    pub const NOT_REGISTERED: i32 = 10004;
    pub const PASSWORD_MISMATCH: i32 = 10005;
    pub const NOT_LOGGED_IN: i32 = 10006;
    pub const STORE_ERROR: i32 = 10007;
    pub const CACHE_ERROR: i32 = 10008;
    pub const UNAUTHORIZED: i32 = 10009;
}

/// 生成会话令牌
///
/// `Deterministic` 模式下令牌为 `sha256("{name}:{salt}")` 的十六进制串，
/// 同一用户多次登录得到同一令牌，并发登录会共用一个会话。
/// `Random` 模式每次登录生成新的 uuid。
pub fn generate_session_token(user_name: &str, mode: TokenMode, salt: &str) -> String {
    match mode {
        TokenMode::Deterministic => {
            let digest = Sha256::digest(format!("{}:{}", user_name, salt).as_bytes());
            format!("{:x}", digest)
        }
        TokenMode::Random => Uuid::new_v4().simple().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_tokens_are_stable_per_user() {
        let a1 = generate_session_token("alice", TokenMode::Deterministic, "session");
        let a2 = generate_session_token("alice", TokenMode::Deterministic, "session");
        let b = generate_session_token("bob", TokenMode::Deterministic, "session");

        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_eq!(a1.len(), 64);
        assert!(a1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn salt_changes_deterministic_token() {
        assert_ne!(
            generate_session_token("alice", TokenMode::Deterministic, "session"),
            generate_session_token("alice", TokenMode::Deterministic, "other")
        );
    }

    #[test]
    fn random_tokens_differ_between_logins() {
        assert_ne!(
            generate_session_token("alice", TokenMode::Random, "session"),
            generate_session_token("alice", TokenMode::Random, "session")
        );
    }

    #[test]
    fn error_response_omits_data() {
        let Json(body) = error_to_api_response::<()>(error_codes::NOT_LOGGED_IN, "未登录".into());
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], 10006);
        assert!(json.get("data").is_none());
    }
}
