//! SCIM resource model.
//!
//! Resources are held generically as a [`ScimObject`]: attributes grouped by
//! schema URI, each bound to its descriptor. Values are either
//! [`SimpleValue`]s or complex values of singular sub-attributes; plural
//! attributes hold lists of complex values.
//!
//! # Key Components
//!
//! * [`ScimObject`] - attributes of one resource grouped by schema
//! * [`ScimAttribute`] / [`AttributeValue`] / [`SimpleValue`] - the value model
//! * [`AttributeValueResolver`] - conversion between values and domain types
//! * [`BaseResource`], [`UserResource`], [`GroupResource`] - typed views
//! * [`value_objects`] - Name, Address, Manager, Meta and plural entries
//! * [`ResourceVersion`] - content-derived versions for optimistic concurrency

pub mod attribute;
pub mod base;
pub mod group;
pub mod object;
pub mod resolver;
pub mod user;
pub mod value;
pub mod value_objects;
pub mod version;

pub use attribute::{AttributeValue, AttributeValues, ScimAttribute};
pub use base::BaseResource;
pub use group::GroupResource;
pub use object::ScimObject;
pub use resolver::{
    AttributeValueResolver, BinaryResolver, BooleanResolver, ComplexValueBuilder,
    DateTimeResolver, IntegerResolver, StringResolver,
};
pub use user::UserResource;
pub use value::SimpleValue;
pub use version::ResourceVersion;
