// 业务服务模块

pub mod account;

pub use account::{AccountService, NicknameUpdate, RegisterParams, UserProfile};
