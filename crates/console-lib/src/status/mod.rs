//! Service health probing and the shared status cache
//!
//! Statuses are pull-based: nothing probes in the background. A refresh
//! probes every managed service and swaps in a complete snapshot.

mod cache;
mod prober;

pub use cache::StatusCache;
pub use prober::{HttpProber, ProbeConfig, DEFAULT_PROBE_TIMEOUT};
pub(crate) use prober::base_url;

use crate::models::{ServiceName, ServiceStatus};

pub use async_trait::async_trait;

/// Trait for service reachability checks
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe a single service. Never fails: unreachable is `Stopped`.
    async fn probe(&self, service: ServiceName) -> ServiceStatus;
}
