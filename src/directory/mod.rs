//! Directory (LDAP) boundary.
//!
//! The resource mappers translate between SCIM resources and directory
//! entries; this module defines what an entry, a modification and a search
//! filter look like, and the two traits a directory backend implements.
//!
//! The directory is responsible for:
//! - storing entries by DN and applying modifications
//! - evaluating filters, sorting and applying size limits
//! - maintaining operational attributes (`createTimestamp`, `modifyTimestamp`)
//!
//! It knows nothing about SCIM descriptors, transformations or wire formats.
//!
//! # Example Usage
//!
//! ```rust
//! use scim_directory::directory::{
//!     DirectoryAttribute, DirectoryFilter, DirectoryReader, DirectoryWriter, Entry,
//!     InMemoryDirectory, SearchRequest,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new();
//!
//! let mut entry = Entry::new("uid=bjensen,dc=example,dc=com");
//! entry.add_attribute(DirectoryAttribute::from_strings("objectClass", ["top", "inetOrgPerson"]));
//! entry.add_attribute(DirectoryAttribute::from_strings("uid", ["bjensen"]));
//! directory.add(entry).await?;
//!
//! let request = SearchRequest::new("dc=example,dc=com", DirectoryFilter::equality("uid", "bjensen"));
//! let found = directory.search(&request).await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod errors;
pub mod filter;
pub mod in_memory;
pub mod url;

pub use entry::{
    DirectoryAttribute, Entry, Modification, ModificationType, escape_dn_value,
    is_descendant_or_self, normalize_dn,
};
pub use errors::DirectoryError;
pub use filter::{DirectoryFilter, escape_filter_value};
pub use in_memory::{
    CREATE_TIMESTAMP, ENTRY_UUID, InMemoryDirectory, MODIFY_TIMESTAMP, format_generalized_time,
};
pub use url::{LdapUrl, SearchScope};

use async_trait::async_trait;

/// Result alias for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Server-side sort on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySort {
    pub attribute: String,
    pub reverse: bool,
}

impl DirectorySort {
    pub fn ascending(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            reverse: false,
        }
    }

    pub fn descending(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            reverse: true,
        }
    }
}

/// A subtree search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base_dn: String,
    pub filter: DirectoryFilter,
    /// Attribute types to return; empty returns all
    pub attributes: Vec<String>,
    pub sort: Option<DirectorySort>,
    /// Maximum number of entries to return
    pub size_limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(base_dn: impl Into<String>, filter: DirectoryFilter) -> Self {
        Self {
            base_dn: base_dn.into(),
            filter,
            attributes: Vec::new(),
            sort: None,
            size_limit: None,
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_sort(mut self, sort: Option<DirectorySort>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_size_limit(mut self, size_limit: Option<usize>) -> Self {
        self.size_limit = size_limit;
        self
    }
}

/// Read access to a directory.
#[async_trait]
pub trait DirectoryReader: Send + Sync {
    /// Fetch one entry by DN, returning only the named attribute types
    /// (all when empty). Missing entries yield `Ok(None)`.
    async fn get_entry(&self, dn: &str, attributes: &[String]) -> DirectoryResult<Option<Entry>>;

    /// Subtree search below `request.base_dn`.
    async fn search(&self, request: &SearchRequest) -> DirectoryResult<Vec<Entry>>;
}

/// Write access to a directory.
#[async_trait]
pub trait DirectoryWriter: DirectoryReader {
    /// Add a new entry, failing if the DN is taken.
    async fn add(&self, entry: Entry) -> DirectoryResult<Entry>;

    /// Apply modifications to an existing entry, returning the result.
    async fn modify(&self, dn: &str, modifications: &[Modification]) -> DirectoryResult<Entry>;

    /// Delete an entry.
    async fn delete(&self, dn: &str) -> DirectoryResult<()>;
}
