//! Application services and ports.

#![forbid(unsafe_code)]

mod count_service;
mod counting_ports;
mod pipeline_config;
mod refresh_service;
mod snapshot_ports;
mod snapshot_service;

#[cfg(test)]
mod test_support;

pub use count_service::{CountInput, CountOutcome, CountService, UpstreamFailure};
pub use counting_ports::{
    Clock, CountRequest, CountingApi, FetchOutcome, FetchResponse, SystemClock,
};
pub use pipeline_config::{PipelineConfig, SnapshotConfig};
pub use refresh_service::{RefreshOutcome, RefreshService};
pub use snapshot_ports::SnapshotKeyValueStore;
pub use snapshot_service::SnapshotStore;
