use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};
use tracing::info;

use foy_core::repository::{ModeStore, RateLimiter, RepoResult};

const DEMO_MODE_KEY: &str = "foy:ads:demo_mode";

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn get_demo_mode(&self) -> RedisResult<Option<bool>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(DEMO_MODE_KEY).await?;
        Ok(raw.map(|v| v == "true"))
    }

    pub async fn set_demo_mode(&self, demo: bool) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set::<_, _, ()>(DEMO_MODE_KEY, if demo { "true" } else { "false" }).await?;
        info!("Demo mode flag stored: {}", demo);
        Ok(())
    }

    /// Fixed-window counter. True while `key` stays within `limit` hits.
    pub async fn count_window_hit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let (count,): (i64,) = window_pipeline(key, window_seconds).query_async(&mut conn).await?;
        Ok(count <= limit)
    }
}

/// INCR plus an expiry set only when the key has none (Redis 7+), so later
/// hits in the window do not push the reset back.
fn window_pipeline(key: &str, window_seconds: i64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .cmd("EXPIRE")
        .arg(key)
        .arg(window_seconds)
        .arg("NX")
        .ignore();
    pipe
}

#[async_trait]
impl ModeStore for RedisClient {
    async fn load_mode(&self) -> RepoResult<Option<bool>> {
        Ok(self.get_demo_mode().await?)
    }

    async fn store_mode(&self, demo: bool) -> RepoResult<()> {
        Ok(self.set_demo_mode(demo).await?)
    }
}

#[async_trait]
impl RateLimiter for RedisClient {
    async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RepoResult<bool> {
        Ok(self.count_window_hit(key, limit, window_seconds).await?)
    }
}
