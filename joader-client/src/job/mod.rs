//! Job path: values returned inline by the job service

pub mod client;
pub mod value;

pub use client::{JobClient, JobFilter};
pub use value::{Image, Value, IMAGE_SIDE};
