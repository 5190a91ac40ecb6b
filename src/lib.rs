//! Editable document model for a binary file viewer.
//!
//! A [`Document`] presents a file of up to 4 GiB as a linear byte range
//! that can be read, edited, and saved without loading it into memory.

pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod segment;
pub mod store;

pub use config::DocumentConfig;
pub use document::{ChangeCause, ChangeEvent, Document, Reader};
pub use edit::{Coalesced, Continuation, EditKind, EditLog, EditRecord};
pub use error::{Error, Result};
pub use segment::{Segment, SegmentList};
pub use store::BackingStore;
