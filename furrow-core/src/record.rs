//! Records reported during training.
//!
//! The evaluation pass and the generation loop report what happened as
//! [`Record`]s, key-value maps of [`RecordValue`]s, written to a
//! [`Recorder`]:
//!
//! * [`LogRecorder`] forwards records to the `log` facade,
//! * [`BufferedRecorder`] keeps them in memory,
//! * [`NullRecorder`] discards them.
//!
//! ```rust
//! use furrow_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("reward", 12.5);
//! record.insert("state", RecordValue::Array1(vec![1.0, 2.0]));
//! assert_eq!(record.get_scalar("reward").unwrap(), 12.5);
//! ```
mod base;
mod recorder;
pub use base::{Record, RecordValue};
pub use recorder::{BufferedRecorder, LogRecorder, NullRecorder, Recorder};
