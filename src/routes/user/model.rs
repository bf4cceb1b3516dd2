use serde::{Deserialize, Serialize};

use crate::services::RegisterParams;

// 注册请求
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub gender: String,
    pub age: i32,
    #[serde(default)]
    pub nickname: String,
}

impl From<RegisterRequest> for RegisterParams {
    fn from(req: RegisterRequest) -> Self {
        Self {
            name: req.username,
            password: req.password,
            gender: req.gender,
            age: req.age,
            nickname: req.nickname,
        }
    }
}

// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// 登录响应，令牌同时写入 cookie
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub token: String,
}

// 注销请求
#[derive(Debug, Deserialize)]
pub struct LogoffRequest {
    pub username: String,
}

// 查询用户信息参数
#[derive(Debug, Deserialize)]
pub struct GetUserInfoQuery {
    #[serde(default)]
    pub username: String,
}

// 修改昵称请求
#[derive(Debug, Deserialize)]
pub struct UpdateNicknameRequest {
    pub username: String,
    pub new_nickname: String,
}

// 修改昵称响应
#[derive(Debug, Serialize)]
pub struct UpdateNicknameResponse {
    pub updated: bool,
}
