//! Raw completion record schema
//!
//! This module defines the input records supplied by the upstream data
//! source, along with decoding from JSON arrays and NDJSON.

mod adapter;
mod raw_record;

pub use adapter::*;
pub use raw_record::*;
