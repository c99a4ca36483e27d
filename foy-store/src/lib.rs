pub mod app_config;
pub mod database;
pub mod ad_repo;
pub mod payment_repo;
pub mod redis_repo;
pub mod events;
pub mod demo;
pub mod memory;

pub use database::DbClient;
pub use redis_repo::RedisClient;
pub use events::EventProducer;
pub use ad_repo::PostgresAdRepository;
pub use payment_repo::PostgresPaymentRepository;
pub use demo::DemoAdRepository;
pub use memory::{InMemoryModeStore, InMemoryPaymentRepository, InMemoryRateLimiter};
