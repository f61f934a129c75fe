//! Integration tests for the directory-backed resource service.
//!
//! Every test builds a fresh service over an empty in-memory directory,
//! drives it with wire-level requests and inspects both the responses and
//! the directory entries they produce.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test integration::
//! cargo test integration::groups -- --nocapture
//! ```

pub mod groups;
pub mod lifecycle;
pub mod query;
pub mod reconfiguration;
pub mod wire_formats;
