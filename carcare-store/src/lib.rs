pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod document;
pub mod memory;
pub mod redis_repo;
pub mod service_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use memory::{MemoryBookingRepository, MemoryServiceRepository, MemorySessionRegistry};
pub use redis_repo::RedisClient;
pub use service_repo::PgServiceRepository;
