// 缓存模块
// 数据库的非权威副本：用户快照 `user:{name}` 和会话 `session:{token}`

pub mod backend;
pub mod keys;
pub mod operations;

pub use backend::{CacheBackend, CacheError, MemoryCache, RedisCache};
pub use operations::{RefreshOutcome, SessionCacheOperations, UserCacheOperations};
