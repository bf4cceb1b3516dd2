use std::time::Duration;

use async_trait::async_trait;
use ::redis::{AsyncCommands, Client as RedisClient, aio::MultiplexedConnection};

use super::{CacheBackend, CacheError};

/// Redis 缓存后端
/// 启动时建立一条多路复用连接，每次调用克隆使用
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// 连接 Redis 并执行一次 PING 确认可用
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = RedisClient::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;

        let pong: String = ::redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!("Redis connection established: {}", pong);

        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SETEX 不接受 0 秒
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
