//! Session-level state and the crate error type.

pub mod context;
pub mod error;
