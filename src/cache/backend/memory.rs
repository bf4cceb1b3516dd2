use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheBackend, CacheError};

/// 进程内缓存后端，带过期时间和故障注入开关
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    fail_write_prefix: Mutex<Option<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// 只让键以 `prefix` 开头的写入失败，传 `None` 关闭
    pub fn set_fail_writes_with_prefix(&self, prefix: Option<&str>) {
        if let Ok(mut guard) = self.fail_write_prefix.lock() {
            *guard = prefix.map(String::from);
        }
    }

    /// 读写删除同时故障，相当于缓存整体不可用
    pub fn set_unavailable(&self, fail: bool) {
        self.set_fail_reads(fail);
        self.set_fail_writes(fail);
        self.set_fail_deletes(fail);
    }

    /// 不经过故障开关直接查看键是否存在且未过期
    pub async fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .await
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at > Instant::now())
    }

    fn write_fault(&self, key: &str) -> Result<(), CacheError> {
        Self::fault(&self.fail_writes, "write")?;
        let prefix_hit = self
            .fail_write_prefix
            .lock()
            .map(|prefix| prefix.as_deref().is_some_and(|p| key.starts_with(p)))
            .unwrap_or(false);
        if prefix_hit {
            return Err(CacheError::Unavailable(format!(
                "memory cache write to {} switched off",
                key
            )));
        }
        Ok(())
    }

    fn fault(flag: &AtomicBool, op: &str) -> Result<(), CacheError> {
        if flag.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable(format!("memory cache {} switched off", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Self::fault(&self.fail_reads, "read")?;

        let mut entries = self.entries.write().await;
        let expired = match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => {
                return Ok(Some(value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.write_fault(key)?;

        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        Self::fault(&self.fail_deletes, "delete")?;

        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set_ex("k", "v".into(), Duration::from_millis(30))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn fault_switches_fail_each_operation() {
        let cache = MemoryCache::new();
        cache.set_fail_writes(true);
        assert!(cache.set_ex("k", "v".into(), Duration::from_secs(1)).await.is_err());

        cache.set_fail_writes(false);
        cache.set_ex("k", "v".into(), Duration::from_secs(1)).await.unwrap();

        cache.set_fail_reads(true);
        assert!(cache.get("k").await.is_err());

        cache.set_fail_deletes(true);
        assert!(cache.del("k").await.is_err());
        assert!(cache.contains("k").await);
    }

    #[tokio::test]
    async fn prefix_write_fault_only_hits_matching_keys() {
        let cache = MemoryCache::new();
        cache.set_fail_writes_with_prefix(Some("user:"));

        assert!(cache.set_ex("user:alice", "v".into(), Duration::from_secs(1)).await.is_err());
        cache.set_ex("session:t", "v".into(), Duration::from_secs(1)).await.unwrap();
        assert!(!cache.contains("user:alice").await);
        assert!(cache.contains("session:t").await);

        cache.set_fail_writes_with_prefix(None);
        cache.set_ex("user:alice", "v".into(), Duration::from_secs(1)).await.unwrap();
    }
}
