//! Unmarshalling rules applied to request bodies.
//!
//! - `schema_policy` - unknown schemas and attributes under the strict and
//!   tolerant policies
//! - `cardinality` - values that do not fit their attribute's shape

pub mod cardinality;
pub mod schema_policy;
