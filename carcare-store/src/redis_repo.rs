use async_trait::async_trait;
use carcare_core::repository::SessionRegistry;
use carcare_core::{CoreError, CoreResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use tracing::info;
use uuid::Uuid;

/// Revoked-session registry. One managed connection is shared by every request and
/// reconnects on its own after a dropped link.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

fn revoked_key(token_id: Uuid) -> String {
    format!("session:revoked:{}", token_id)
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Redis connection established");
        Ok(Self { conn })
    }

    pub async fn set_revoked(&self, token_id: Uuid, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        // EX 0 is rejected by the server
        conn.set_ex::<_, _, ()>(revoked_key(token_id), 1, ttl_seconds.max(1)).await?;
        info!("Session revoked: {} (ttl {}s)", token_id, ttl_seconds);
        Ok(())
    }

    pub async fn check_revoked(&self, token_id: Uuid) -> RedisResult<bool> {
        let mut conn = self.conn.clone();
        conn.exists(revoked_key(token_id)).await
    }
}

#[async_trait]
impl SessionRegistry for RedisClient {
    async fn revoke(&self, token_id: Uuid, ttl_seconds: u64) -> CoreResult<()> {
        self.set_revoked(token_id, ttl_seconds)
            .await
            .map_err(|e| CoreError::StorageError(format!("Redis: {}", e)))
    }

    async fn is_revoked(&self, token_id: Uuid) -> CoreResult<bool> {
        self.check_revoked(token_id)
            .await
            .map_err(|e| CoreError::StorageError(format!("Redis: {}", e)))
    }
}
