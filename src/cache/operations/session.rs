use std::sync::Arc;
use std::time::Duration;

use crate::cache::backend::{CacheBackend, CacheError};
use crate::cache::keys::user_keys;
use crate::database::models::user::UserEntity;

/// 会话缓存操作
/// `session:{token}` 保存登录时的用户快照，过期由缓存后端负责
#[derive(Clone)]
pub struct SessionCacheOperations {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl SessionCacheOperations {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// 缓存会话
    pub async fn put_session(&self, user: &UserEntity, token: &str) -> Result<(), CacheError> {
        let key = user_keys::session_key(token);
        let json = serde_json::to_string(user)?;
        self.backend.set_ex(&key, json, self.ttl).await
    }

    /// 获取会话，未登录或已过期时返回 `Ok(None)`
    pub async fn get_session(&self, token: &str) -> Result<Option<UserEntity>, CacheError> {
        let key = user_keys::session_key(token);
        match self.backend.get(&key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 删除会话
    pub async fn delete_session(&self, token: &str) -> Result<(), CacheError> {
        tracing::debug!("Deleting session {}", token);
        let key = user_keys::session_key(token);
        self.backend.del(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::MemoryCache;
    use crate::database::models::user::Gender;
    use chrono::Utc;

    fn alice() -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id: 7,
            name: "alice".into(),
            gender: Gender::Female,
            age: 30,
            password: "x".into(),
            nickname: "al".into(),
            creator: "alice".into(),
            create_time: now,
            modifier: "alice".into(),
            modify_time: now,
        }
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let cache = Arc::new(MemoryCache::new());
        let sessions = SessionCacheOperations::new(cache.clone(), Duration::from_secs(60));
        let user = alice();

        sessions.put_session(&user, "tok").await.unwrap();
        assert!(cache.contains("session:tok").await);
        assert_eq!(sessions.get_session("tok").await.unwrap(), Some(user));

        sessions.delete_session("tok").await.unwrap();
        assert_eq!(sessions.get_session("tok").await.unwrap(), None);
    }

    #[tokio::test]
    async fn session_expires_with_ttl() {
        let cache = Arc::new(MemoryCache::new());
        let sessions = SessionCacheOperations::new(cache, Duration::from_millis(30));

        sessions.put_session(&alice(), "tok").await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sessions.get_session("tok").await.unwrap(), None);
    }
}
