//! LogHUD Model - Core record and envelope types
//!
//! This crate provides the types that flow through the fabric:
//! - `LogRecord` - the normalized record every parser produces and the
//!   agent POSTs to the hub
//! - `Level` - severity string constants
//! - `meta` - envelope `_meta` field names shared by the hub stamper and
//!   anything that verifies envelopes
//!
//! # Design Principles
//!
//! - **Stable JSON shape**: optional fields are omitted when empty, so a
//!   record serializes to exactly the keys it carries
//! - **Schema-light**: the hub treats publish bodies as opaque JSON
//!   objects; only the agent side is typed

mod level;
mod record;

pub mod meta;

pub use level::Level;
pub use record::LogRecord;
