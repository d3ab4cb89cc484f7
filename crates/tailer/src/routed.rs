//! The routing envelope emitted by the tailer

use std::sync::Arc;

use loghud_model::LogRecord;

/// One parsed line together with its configured destinations
///
/// `targets` is the static list of URI paths declared for the source
/// file; it is shared rather than cloned per line.
#[derive(Debug, Clone)]
pub struct RoutedRecord {
    /// The parsed record
    pub record: LogRecord,
    /// URI paths the record is POSTed to
    pub targets: Arc<[String]>,
}
