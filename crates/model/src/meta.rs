//! Envelope `_meta` field names
//!
//! The hub merges a `_meta` object into every accepted publish body.
//! These constants are the single source of truth for its key names so
//! the stamper, the verifier and the tests cannot drift apart.

/// Reserved top-level key holding stamp metadata
pub const META_KEY: &str = "_meta";

/// Time-ordered 128-bit identifier, canonical string form
pub const ID: &str = "id";

/// RFC-3339 timestamp with nanoseconds, UTC
pub const TS: &str = "ts";

/// Integer nanoseconds since the Unix epoch
pub const UNIX_NS: &str = "unixNs";

/// Identifier of the hub that first stamped the envelope
pub const ORIGIN_NODE_ID: &str = "originNodeId";

/// Channel path, with leading slash
pub const CHANNEL: &str = "channel";

/// Cluster key version used for the HMAC
pub const KEY_VERSION: &str = "keyVersion";

/// Base64 HMAC-SHA256 over the envelope with this field absent
pub const HMAC: &str = "hmac";
