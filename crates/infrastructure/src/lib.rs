//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod env_settings;
mod http_counting_api;
mod in_memory_snapshot_store;
mod pipeline;
mod redis_snapshot_store;

pub use env_settings::{DEFAULT_HASHTAG, PipelineSettings};
pub use http_counting_api::{DEFAULT_COUNTING_API_BASE_URL, HttpCountingApi};
pub use in_memory_snapshot_store::InMemorySnapshotStore;
pub use pipeline::{Pipeline, SnapshotBackend, build_http_client, connect_snapshot_backend};
pub use redis_snapshot_store::RedisSnapshotStore;
