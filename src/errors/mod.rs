//! Domain-specific error types for draftstore.
//!
//! Backend call failures are propagated as `anyhow` errors carrying the
//! backend's message; the enums here cover the structured cases the caller
//! can act on: missing records, read-only system projects, and operations
//! that require authentication. Storage corruption never surfaces as an
//! error at all; the stores recover by resetting to an empty payload.

pub mod store;

pub use store::StoreError;
