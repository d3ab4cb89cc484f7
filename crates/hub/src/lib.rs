//! LogHUD Hub - Multi-channel real-time log fan-out
//!
//! The hub accepts log records over HTTP, stamps them with authenticated
//! metadata and fans them out to WebSocket subscribers per channel, with
//! opportunistic replication to peer hubs.
//!
//! # Architecture
//!
//! ```text
//! POST /<channel>
//!     │
//!     ▼
//! Stamper (_meta: id, ts, originNodeId, keyVersion, hmac)
//!     │
//!     ├──→ PeerForwarder ──→ peer hubs (X-LogHUD-Origin stops loops)
//!     ▼
//! HubRegistry ──→ Hub (per channel)
//!                  │ ingress queue (1024, drop-newest)
//!                  ▼
//!              fan-out task
//!                  │ per-subscriber queues (256, drop-newest)
//!                  ▼
//!              writer tasks ──→ WebSocket subscribers
//! ```
//!
//! Ordering is preserved per channel into each subscriber's queue; a
//! slow subscriber only ever loses its own envelopes.

mod config;
mod error;
mod hub;
mod peers;
mod registry;
mod server;
mod stamp;

pub use config::HubConfig;
pub use error::{HubError, Result};
pub use hub::{Hub, HubMetrics, HubMetricsSnapshot, INGRESS_CAPACITY, SUBSCRIBER_CAPACITY};
pub use peers::{PeerForwarder, ORIGIN_HEADER};
pub use registry::HubRegistry;
pub use server::{build_router, serve, serve_with_listener, AppState, MAX_PUBLISH_BYTES};
pub use stamp::Stamper;
