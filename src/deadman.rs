//! Deadman policy: templates and thresholds for liveness alerts.
//!
//! A deadman alert fires when a node's emitted-point rate drops below a
//! threshold. The pipeline carries one [`DeadmanPolicy`] configured at
//! creation time; the `deadman` builder on any node expands into a
//! stats → derivative → alert subgraph (see
//! [`NodeExt::deadman`](crate::chain::NodeExt::deadman)) and renders the
//! policy's identifier and message templates for the alert.
//!
//! Templates use two placeholder specifiers, substituted in one place by
//! [`DeadmanPolicy::render`]: [`NODE_NAME`] is replaced with the observed
//! node's display name and [`INTERVAL`] with the InfluxQL form of the
//! measurement interval.

use crate::duration::Duration;

/// Placeholder replaced by the observed node's display name.
pub const NODE_NAME: &str = "NODE_NAME";

/// Placeholder replaced by the InfluxQL form of the deadman interval.
pub const INTERVAL: &str = "INTERVAL";

/// Pipeline-wide configuration for deadman alerts.
#[derive(Clone, Debug, PartialEq)]
pub struct DeadmanPolicy {
    /// Emitted-points-per-interval threshold at or below which the alert is
    /// critical.
    pub threshold: f64,
    /// How often throughput is measured.
    pub interval: Duration,
    /// Template for the alert identifier.
    pub id: String,
    /// Template for the alert message.
    pub message: String,
    /// When set, the loader applies a deadman to every eligible node.
    pub global: bool,
}

impl Default for DeadmanPolicy {
    fn default() -> Self {
        DeadmanPolicy {
            threshold: 0.0,
            interval: Duration::seconds(10),
            id: format!("{NODE_NAME}:deadman"),
            message: format!(
                "{NODE_NAME} is dead: emitted dropped to or below threshold over {INTERVAL}"
            ),
            global: false,
        }
    }
}

impl DeadmanPolicy {
    /// Substitute the placeholder specifiers in `template`.
    pub fn render(template: &str, node_name: &str, interval: Duration) -> String {
        template
            .replace(NODE_NAME, node_name)
            .replace(INTERVAL, &interval.to_string())
    }
}
