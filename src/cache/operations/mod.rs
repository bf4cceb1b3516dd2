/// 缓存操作
/// 用户快照和会话两个命名空间的读写

pub mod session;
pub mod user;

pub use session::SessionCacheOperations;
pub use user::{RefreshOutcome, UserCacheOperations};
