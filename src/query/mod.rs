//! Query parameters: filters, requested attributes, sorting and paging.
//!
//! These are the protocol-level inputs of a read or query. The resource
//! mappers translate them into directory terms; the resource service uses
//! [`PageParameters`] to cut the result into pages.

pub mod attributes;
pub mod filter;
pub mod page;

pub use attributes::QueryAttributes;
pub use filter::{AttributePath, FilterOperator, ScimFilter};
pub use page::{PageParameters, SortOrder, SortParameters};
