//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `lock_positions_created_total` - Lock positions created
//! - `lock_releases_total` - Successful releases
//! - `lock_release_rollbacks_total` - Releases rolled back after an external failure
//! - `lock_positions_active` - Positions with a non-zero locked amount

use prometheus::{IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Positions created
    pub positions_created: IntCounter,

    /// Successful releases
    pub releases: IntCounter,

    /// Releases rolled back after an external call failed
    pub release_rollbacks: IntCounter,

    /// Positions with remaining locked amount
    pub positions_active: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let positions_created = IntCounter::new(
            "lock_positions_created_total",
            "Lock positions created",
        )?;
        registry.register(Box::new(positions_created.clone()))?;

        let releases = IntCounter::new("lock_releases_total", "Successful releases")?;
        registry.register(Box::new(releases.clone()))?;

        let release_rollbacks = IntCounter::new(
            "lock_release_rollbacks_total",
            "Releases rolled back after an external failure",
        )?;
        registry.register(Box::new(release_rollbacks.clone()))?;

        let positions_active = IntGauge::new(
            "lock_positions_active",
            "Positions with a non-zero locked amount",
        )?;
        registry.register(Box::new(positions_active.clone()))?;

        Ok(Self {
            positions_created,
            releases,
            release_rollbacks,
            positions_active,
            registry,
        })
    }

    /// Record position creation
    pub fn record_lock(&self) {
        self.positions_created.inc();
        self.positions_active.inc();
    }

    /// Record a successful release; `drained` marks the locked amount
    /// reaching zero
    pub fn record_release(&self, drained: bool) {
        self.releases.inc();
        if drained {
            self.positions_active.dec();
        }
    }

    /// Record a rolled-back release
    pub fn record_rollback(&self) {
        self.release_rollbacks.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
