// 数据库模块
// 包含用户实体定义和存储库实现

pub mod models;
pub mod repositories;

pub use models::user::{Gender, NewUser, UserEntity, UserPatch};
pub use repositories::{MemoryUserStore, PgUserStore, StoreError, UserStore};
