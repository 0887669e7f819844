use super::Record;
use log::info;

/// Writes records to an output destination.
pub trait Recorder {
    /// Writes a record.
    fn write(&mut self, record: Record);

    /// Flushes buffered output, if any.
    fn flush(&mut self) {}
}

/// A recorder that ignores any record.
#[derive(Default)]
pub struct NullRecorder {}

impl NullRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self {}
    }
}

impl Recorder for NullRecorder {
    /// Discard the given record.
    fn write(&mut self, _record: Record) {}
}

/// Buffered recorder.
///
/// Keeps every record in memory, e.g. to inspect an evaluation trace.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.buf.iter()
    }

    /// Number of records written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

/// Writes each record as one `info` log line.
pub struct LogRecorder {
    prefix: String,
}

impl LogRecorder {
    /// Constructs a recorder tagging lines with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new("record")
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        info!("[{}] {}", self.prefix, record);
    }
}
