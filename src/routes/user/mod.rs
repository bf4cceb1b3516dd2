mod handler;
mod model;

pub use handler::{get_user_info, login, logoff, logout, register, update_nick_name};
pub use model::{
    GetUserInfoQuery, LoginRequest, LoginResponse, LogoffRequest, RegisterRequest,
    UpdateNicknameRequest, UpdateNicknameResponse,
};
