//! Local staging module
//!
//! Writes query rows to a temporary delimited UTF-8 file and reads it back.
//!
//! # Overview
//!
//! - `StagingFormat` - delimiter/quote/escape/quoting rules
//! - `StagingWriter` - row sink producing a `StagedFile`
//! - `StagedFile` - guard that deletes the file on drop
//! - `read_records` - parse a staged file with the same rules

mod format;
mod reader;
mod writer;

pub use format::{QuotingPolicy, StagingFormat};
pub use reader::read_records;
pub use writer::{StagedFile, StagingWriter};
