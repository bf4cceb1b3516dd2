/// 缓存键模块
pub mod user_keys;

pub use user_keys::{session_key, user_info_key};
