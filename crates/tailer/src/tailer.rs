//! The file tailer task
//!
//! `FileTailer` owns the tail state of every configured file and reacts
//! to filesystem events:
//!
//! - `WRITE`: read appended bytes from `last_pos`; a shrinking file is a
//!   truncate rotation and rewinds to zero
//! - `CREATE`: (re)open at offset zero and read whatever is already there
//! - `REMOVE`/`RENAME`: drop the handle and wait for the next create;
//!   the parent-directory watch stays so the path can rebind
//!
//! Only complete lines are consumed: bytes after the last LF stay
//! unread until a later write completes them, so a line is never emitted
//! in pieces.

use std::collections::{HashMap, HashSet};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use loghud_parsers::{parser_for, LineParser};

use crate::error::{Result, TailerError};
use crate::metrics::TailerMetrics;
use crate::routed::RoutedRecord;

/// One file to tail and where its records go
#[derive(Debug, Clone)]
pub struct TailedFileConfig {
    /// Absolute path of the log file
    pub path: PathBuf,
    /// Parser format identifier
    pub format: String,
    /// URI paths records from this file are routed to
    pub targets: Arc<[String]>,
}

impl TailedFileConfig {
    /// Create a config entry
    pub fn new(
        path: impl Into<PathBuf>,
        format: impl Into<String>,
        targets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            path: path.into(),
            format: format.into(),
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }
}

/// Tail state of a single file
struct FileTail {
    config: TailedFileConfig,
    parser: Box<dyn LineParser>,
    /// Open handle; `None` while waiting for the file to (re)appear
    file: Option<File>,
    /// Byte offset the next read starts from
    last_pos: u64,
    /// Size observed at the prior read; a smaller stat means truncation
    last_size: u64,
}

/// Follows every configured file and emits `RoutedRecord`s
pub struct FileTailer {
    files: HashMap<PathBuf, FileTail>,
    watcher: RecommendedWatcher,
    fs_events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    records: mpsc::Sender<RoutedRecord>,
    metrics: Arc<TailerMetrics>,
    started: bool,
}

/// Event kinds the tailer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileEvent {
    Written,
    Created,
    Removed,
}

/// Map a notifier event kind onto the tailer's state machine.
///
/// Renames arrive as name-modify events and are handled like removals:
/// the handle is dropped and the parent watch rebinds on create.
fn classify(kind: &EventKind) -> Option<FileEvent> {
    match kind {
        EventKind::Create(_) => Some(FileEvent::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FileEvent::Removed),
        EventKind::Modify(_) => Some(FileEvent::Written),
        EventKind::Remove(_) => Some(FileEvent::Removed),
        _ => None,
    }
}

impl FileTailer {
    /// Create a tailer and the receiving half of its record channel
    ///
    /// `buffer_size` is the capacity of the tailer → dispatcher channel
    /// (the `general.buffer_size` config value).
    ///
    /// # Errors
    ///
    /// Fails when the notifier cannot be created or a file declares an
    /// unknown format.
    pub fn new(
        files: Vec<TailedFileConfig>,
        buffer_size: usize,
    ) -> Result<(Self, mpsc::Receiver<RoutedRecord>)> {
        let (event_tx, fs_events) = mpsc::unbounded_channel();
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        })?;

        let mut states = HashMap::with_capacity(files.len());
        for config in files {
            let parser =
                parser_for(&config.format).ok_or_else(|| TailerError::UnknownFormat {
                    format: config.format.clone(),
                })?;
            states.insert(
                config.path.clone(),
                FileTail {
                    config,
                    parser,
                    file: None,
                    last_pos: 0,
                    last_size: 0,
                },
            );
        }

        let (records, receiver) = mpsc::channel(buffer_size.max(1));

        Ok((
            Self {
                files: states,
                watcher,
                fs_events,
                records,
                metrics: Arc::new(TailerMetrics::new()),
                started: false,
            },
            receiver,
        ))
    }

    /// Shared counters for status reporting
    pub fn metrics(&self) -> Arc<TailerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Set up watches and open existing files at their current end.
    ///
    /// Existing content is skipped: only lines appended after this point
    /// are emitted. Idempotent; `run` calls it if it has not happened.
    pub async fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        // Parent directories are watched unconditionally so that
        // deletion, rename and recreate stay observable.
        let mut parents = HashSet::new();
        for path in self.files.keys() {
            if let Some(parent) = path.parent() {
                parents.insert(parent.to_path_buf());
            }
        }
        for parent in &parents {
            self.watcher
                .watch(parent, RecursiveMode::NonRecursive)
                .map_err(TailerError::Notify)?;
        }

        let paths: Vec<PathBuf> = self.files.keys().cloned().collect();
        for path in paths {
            let state = match self.files.get_mut(&path) {
                Some(state) => state,
                None => continue,
            };
            if !path.exists() {
                info!(path = %path.display(), "file absent, waiting for creation");
                continue;
            }
            match open_file(state, SeekFrom::End(0)).await {
                Ok(()) => {
                    let _ = self.watcher.watch(&path, RecursiveMode::NonRecursive);
                    debug!(
                        path = %path.display(),
                        offset = state.last_pos,
                        "tailing from end"
                    );
                }
                Err(e) => {
                    self.metrics.record_io_error();
                    warn!(path = %path.display(), error = %e, "failed to open file");
                }
            }
        }

        info!(files = self.files.len(), "file tailer started");
        Ok(())
    }

    /// Drive the tailer until cancellation.
    ///
    /// Notifier errors are logged and the loop continues; only
    /// cancellation (or the notifier going away) ends it.
    pub async fn run(mut self, cancel: CancellationToken) {
        if let Err(e) = self.start().await {
            warn!(error = %e, "tailer startup failed");
            return;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe = self.fs_events.recv() => match maybe {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(e)) => warn!(error = %e, "filesystem notifier error"),
                    None => break,
                },
            }
        }

        // Handles close on drop; watches are released with the watcher.
        info!("file tailer stopped");
    }

    /// Dispatch one notifier event to the per-file handlers
    async fn handle_event(&mut self, event: Event) {
        let Some(kind) = classify(&event.kind) else {
            return;
        };

        let targets: Vec<PathBuf> = event
            .paths
            .iter()
            .filter(|p| self.files.contains_key(p.as_path()))
            .cloned()
            .collect();

        for path in targets {
            match kind {
                FileEvent::Written => self.handle_write(&path).await,
                FileEvent::Created => self.handle_create(&path).await,
                FileEvent::Removed => self.handle_remove(&path),
            }
        }
    }

    /// `WRITE`: read appended bytes, detecting truncate rotation
    async fn handle_write(&mut self, path: &Path) {
        let Some(state) = self.files.get_mut(path) else {
            return;
        };

        if state.file.is_none() {
            match open_file(state, SeekFrom::End(0)).await {
                Ok(()) => {
                    self.metrics.record_reopen();
                    let _ = self.watcher.watch(path, RecursiveMode::NonRecursive);
                }
                Err(e) => {
                    self.metrics.record_io_error();
                    warn!(path = %path.display(), error = %e, "failed to open file on write");
                }
            }
            return;
        }

        let current_size = {
            let Some(file) = state.file.as_ref() else {
                return;
            };
            match file.metadata().await {
                Ok(meta) => meta.len(),
                Err(e) => {
                    self.metrics.record_io_error();
                    warn!(path = %path.display(), error = %e, "stat failed, waiting for recreate");
                    reset(state);
                    let _ = self.watcher.unwatch(path);
                    return;
                }
            }
        };

        if current_size < state.last_size {
            // Rotation by truncation: rewind and read from the start
            self.metrics.record_truncation();
            info!(
                path = %path.display(),
                old_size = state.last_size,
                new_size = current_size,
                "file truncated, rewinding"
            );
            if let Err(e) = open_file(state, SeekFrom::Start(0)).await {
                self.metrics.record_io_error();
                warn!(path = %path.display(), error = %e, "reopen after truncation failed");
                reset(state);
                let _ = self.watcher.unwatch(path);
                return;
            }
        }

        if let Err(e) = read_new_lines(state, &self.records, &self.metrics).await {
            self.metrics.record_io_error();
            warn!(path = %path.display(), error = %e, "read failed, waiting for recreate");
            reset(state);
            let _ = self.watcher.unwatch(path);
        }
    }

    /// `CREATE`: open at offset zero and pick up anything already written
    async fn handle_create(&mut self, path: &Path) {
        let Some(state) = self.files.get_mut(path) else {
            return;
        };

        match open_file(state, SeekFrom::Start(0)).await {
            Ok(()) => {
                self.metrics.record_reopen();
                let _ = self.watcher.watch(path, RecursiveMode::NonRecursive);
                debug!(path = %path.display(), "file created, tailing from start");
                if let Err(e) = read_new_lines(state, &self.records, &self.metrics).await {
                    self.metrics.record_io_error();
                    warn!(path = %path.display(), error = %e, "read after create failed");
                    reset(state);
                }
            }
            Err(e) => {
                self.metrics.record_io_error();
                warn!(path = %path.display(), error = %e, "failed to open created file");
            }
        }
    }

    /// `REMOVE`/`RENAME`: drop the handle, keep the parent watch
    fn handle_remove(&mut self, path: &Path) {
        let Some(state) = self.files.get_mut(path) else {
            return;
        };
        if state.file.take().is_some() {
            debug!(path = %path.display(), "file removed, waiting for recreate");
        }
        reset(state);
        let _ = self.watcher.unwatch(path);
    }
}

/// Open (or reopen) the file, positioning per `seek`
async fn open_file(state: &mut FileTail, seek: SeekFrom) -> std::io::Result<()> {
    let file = File::open(&state.config.path).await?;
    let size = file.metadata().await?.len();
    state.file = Some(file);
    match seek {
        SeekFrom::Start(pos) => {
            state.last_pos = pos;
            state.last_size = pos;
        }
        _ => {
            state.last_pos = size;
            state.last_size = size;
        }
    }
    Ok(())
}

/// Reset a file to the waiting-for-create state
fn reset(state: &mut FileTail) {
    state.file = None;
    state.last_pos = 0;
    state.last_size = 0;
}

/// Read from `last_pos` to EOF and emit every complete line.
///
/// Bytes after the last LF are left unconsumed; `last_pos` only moves
/// past lines that were actually emitted (or skipped as empty).
async fn read_new_lines(
    state: &mut FileTail,
    records: &mpsc::Sender<RoutedRecord>,
    metrics: &TailerMetrics,
) -> std::io::Result<()> {
    let Some(file) = state.file.as_mut() else {
        return Ok(());
    };

    let size = file.metadata().await?.len();
    if size <= state.last_pos {
        state.last_size = size.max(state.last_pos);
        return Ok(());
    }

    file.seek(SeekFrom::Start(state.last_pos)).await?;
    let mut buf = Vec::with_capacity((size - state.last_pos) as usize);
    file.read_to_end(&mut buf).await?;

    let mut consumed = 0usize;
    while let Some(nl) = buf[consumed..].iter().position(|b| *b == b'\n') {
        let end = consumed + nl;
        let mut line = &buf[consumed..end];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        consumed = end + 1;

        if line.is_empty() {
            continue;
        }

        let text = String::from_utf8_lossy(line);
        let record = state.parser.parse(&text);
        let routed = RoutedRecord {
            record,
            targets: Arc::clone(&state.config.targets),
        };
        match records.try_send(routed) {
            Ok(()) => metrics.record_emitted(),
            Err(mpsc::error::TrySendError::Full(_)) => {
                metrics.record_dropped();
                warn!(
                    path = %state.config.path.display(),
                    "dispatcher channel full, dropping line"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                metrics.record_dropped();
            }
        }
    }

    state.last_pos += consumed as u64;
    state.last_size = size.max(state.last_pos);
    Ok(())
}

#[cfg(test)]
#[path = "tailer_test.rs"]
mod tests;
