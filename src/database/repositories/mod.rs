// 用户存储库
// 数据库是用户记录的唯一权威来源

use async_trait::async_trait;

use crate::database::models::user::{NewUser, UserEntity, UserPatch};

pub mod memory;
pub mod user;

pub use memory::MemoryUserStore;
pub use user::PgUserStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user already exists: {0}")]
    AlreadyExists(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// 身份存储接口
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 按用户名查找，不存在时返回 `Ok(None)`
    async fn find_by_name(&self, name: &str) -> Result<Option<UserEntity>, StoreError>;

    /// 插入新用户，调用方需先确认用户名不存在
    async fn create(&self, user: NewUser) -> Result<UserEntity, StoreError>;

    async fn delete(&self, user: &UserEntity) -> Result<(), StoreError>;

    /// 更新部分字段，返回受影响行数
    async fn update_fields(&self, name: &str, patch: &UserPatch) -> Result<u64, StoreError>;
}
