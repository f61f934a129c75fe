//! Domain value objects and their attribute value resolvers.
//!
//! Each value object is a plain struct of optional fields paired with a
//! resolver that converts it to and from a complex [`AttributeValue`].
//! Converting a value object to an attribute value and back yields the
//! same value object for every combination of absent fields.
//!
//! [`AttributeValue`]: crate::resource::AttributeValue

pub mod address;
pub mod entry;
pub mod manager;
pub mod meta;
pub mod name;

pub use address::{Address, AddressResolver};
pub use entry::{Entry, EntryResolver};
pub use manager::{Manager, ManagerResolver};
pub use meta::{Meta, MetaResolver};
pub use name::{Name, NameResolver};
