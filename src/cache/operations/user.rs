use std::sync::Arc;
use std::time::Duration;

use crate::cache::backend::{CacheBackend, CacheError};
use crate::cache::keys::user_keys;
use crate::database::models::user::UserEntity;

/// 刷新用户快照的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// 快照已写入最新数据
    Refreshed,
    /// 写入失败，旧快照已删除
    Invalidated,
}

/// 用户信息快照缓存操作
/// 快照只是数据库的副本，丢失只影响性能
#[derive(Clone)]
pub struct UserCacheOperations {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl UserCacheOperations {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// 从缓存获取用户快照
    pub async fn get_user_snapshot(&self, name: &str) -> Result<Option<UserEntity>, CacheError> {
        let key = user_keys::user_info_key(name);
        match self.backend.get(&key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 缓存用户快照
    pub async fn put_user_snapshot(&self, user: &UserEntity) -> Result<(), CacheError> {
        let key = user_keys::user_info_key(&user.name);
        let json = serde_json::to_string(user)?;
        self.backend.set_ex(&key, json, self.ttl).await
    }

    /// 删除用户快照
    pub async fn invalidate_user_snapshot(&self, name: &str) -> Result<(), CacheError> {
        let key = user_keys::user_info_key(name);
        self.backend.del(&key).await
    }

    /// 数据库变更后刷新快照，写入失败时删除旧快照，避免缓存与数据库不一致
    pub async fn refresh_cached_user(&self, user: &UserEntity) -> Result<RefreshOutcome, CacheError> {
        let put_err = match self.put_user_snapshot(user).await {
            Ok(()) => return Ok(RefreshOutcome::Refreshed),
            Err(e) => e,
        };
        tracing::warn!(
            "Failed to refresh cached user {}: {}, invalidating instead",
            user.name,
            put_err
        );

        match self.invalidate_user_snapshot(&user.name).await {
            Ok(()) => Ok(RefreshOutcome::Invalidated),
            Err(e) => {
                tracing::error!(
                    "Cached user {} may be stale: refresh failed ({}) and invalidate failed ({})",
                    user.name,
                    put_err,
                    e
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::MemoryCache;
    use crate::database::models::user::Gender;
    use chrono::Utc;

    fn user(nickname: &str) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id: 1,
            name: "alice".into(),
            gender: Gender::Female,
            age: 30,
            password: "x".into(),
            nickname: nickname.into(),
            creator: "alice".into(),
            create_time: now,
            modifier: "alice".into(),
            modify_time: now,
        }
    }

    fn ops(cache: &Arc<MemoryCache>) -> UserCacheOperations {
        UserCacheOperations::new(cache.clone(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_backend() {
        let cache = Arc::new(MemoryCache::new());
        let ops = ops(&cache);
        let alice = user("al");

        assert_eq!(ops.get_user_snapshot("alice").await.unwrap(), None);
        ops.put_user_snapshot(&alice).await.unwrap();
        assert!(cache.contains("user:alice").await);
        assert_eq!(ops.get_user_snapshot("alice").await.unwrap(), Some(alice));

        ops.invalidate_user_snapshot("alice").await.unwrap();
        assert!(!cache.contains("user:alice").await);
    }

    #[tokio::test]
    async fn refresh_overwrites_existing_snapshot() {
        let cache = Arc::new(MemoryCache::new());
        let ops = ops(&cache);
        ops.put_user_snapshot(&user("old")).await.unwrap();

        let outcome = ops.refresh_cached_user(&user("new")).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Refreshed);
        let cached = ops.get_user_snapshot("alice").await.unwrap().unwrap();
        assert_eq!(cached.nickname, "new");
    }

    #[tokio::test]
    async fn refresh_invalidates_when_write_fails() {
        let cache = Arc::new(MemoryCache::new());
        let ops = ops(&cache);
        ops.put_user_snapshot(&user("old")).await.unwrap();

        cache.set_fail_writes(true);
        let outcome = ops.refresh_cached_user(&user("new")).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Invalidated);
        assert!(!cache.contains("user:alice").await);
    }

    #[tokio::test]
    async fn refresh_reports_error_when_compensation_fails() {
        let cache = Arc::new(MemoryCache::new());
        let ops = ops(&cache);
        ops.put_user_snapshot(&user("old")).await.unwrap();

        cache.set_fail_writes(true);
        cache.set_fail_deletes(true);
        assert!(ops.refresh_cached_user(&user("new")).await.is_err());
        assert!(cache.contains("user:alice").await);
    }

    #[tokio::test]
    async fn corrupt_snapshot_surfaces_as_codec_error() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set_ex("user:alice", "not json".into(), Duration::from_secs(60))
            .await
            .unwrap();

        let err = ops(&cache).get_user_snapshot("alice").await.unwrap_err();
        assert!(matches!(err, CacheError::Codec(_)));
    }
}
