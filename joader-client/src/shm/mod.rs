//! Shared-memory data plane
//!
//! Bounds-checked access to the segment the server fills with records.

pub mod header;
pub mod region;

pub use header::{RecordHeader, SlotRef, HEADER_SIZE, READ_FLAG_COUNT, READ_FLAG_OFFSET};
pub use region::SharedMemoryRegion;
