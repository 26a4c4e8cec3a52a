//! Async runtime management
//!
//! Provides the dedicated runtime fetch workers run on when the caller has
//! no runtime of its own.

pub mod executor;

pub use executor::{LoaderRuntime, RuntimeConfig};
