//! Directory-specific error types.
//!
//! These errors report failures of the directory collaborator using LDAP
//! result codes. They know nothing about SCIM; [`DirectoryError::status_code`]
//! is the single place where a directory outcome is mapped onto an HTTP
//! status.

use std::fmt;

/// LDAP result codes surfaced by directory operations.
pub mod result_code {
    pub const OPERATIONS_ERROR: u32 = 1;
    pub const SIZE_LIMIT_EXCEEDED: u32 = 4;
    pub const UNDEFINED_ATTRIBUTE_TYPE: u32 = 17;
    pub const NO_SUCH_OBJECT: u32 = 32;
    pub const INVALID_DN_SYNTAX: u32 = 34;
    pub const INSUFFICIENT_ACCESS_RIGHTS: u32 = 50;
    pub const BUSY: u32 = 51;
    pub const UNAVAILABLE: u32 = 52;
    pub const UNWILLING_TO_PERFORM: u32 = 53;
    pub const OBJECT_CLASS_VIOLATION: u32 = 65;
    pub const ENTRY_ALREADY_EXISTS: u32 = 68;
    pub const OTHER: u32 = 80;
}

/// Errors that can occur during directory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The target entry does not exist.
    NoSuchObject { dn: String },

    /// An entry with the same DN already exists.
    EntryAlreadyExists { dn: String },

    /// The DN could not be parsed.
    InvalidDnSyntax { dn: String },

    /// The bound identity may not perform the operation.
    InsufficientAccess { operation: String, dn: String },

    /// The entry violates its object class definitions.
    ObjectClassViolation { dn: String, message: String },

    /// The directory is temporarily unavailable or busy.
    Unavailable { message: String },

    /// The filter string could not be parsed.
    InvalidFilter { filter: String, message: String },

    /// Any other result code.
    Other { result_code: u32, message: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::NoSuchObject { dn } => write!(f, "No such object: {}", dn),
            DirectoryError::EntryAlreadyExists { dn } => {
                write!(f, "Entry already exists: {}", dn)
            }
            DirectoryError::InvalidDnSyntax { dn } => write!(f, "Invalid DN syntax: {}", dn),
            DirectoryError::InsufficientAccess { operation, dn } => {
                write!(f, "Insufficient access rights to {} {}", operation, dn)
            }
            DirectoryError::ObjectClassViolation { dn, message } => {
                write!(f, "Object class violation for {}: {}", dn, message)
            }
            DirectoryError::Unavailable { message } => {
                write!(f, "Directory unavailable: {}", message)
            }
            DirectoryError::InvalidFilter { filter, message } => {
                write!(f, "Invalid filter '{}': {}", filter, message)
            }
            DirectoryError::Other {
                result_code,
                message,
            } => write!(f, "Directory error (result code {}): {}", result_code, message),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl DirectoryError {
    /// Create a new NoSuchObject error.
    pub fn no_such_object(dn: impl Into<String>) -> Self {
        Self::NoSuchObject { dn: dn.into() }
    }

    /// Create a new EntryAlreadyExists error.
    pub fn entry_already_exists(dn: impl Into<String>) -> Self {
        Self::EntryAlreadyExists { dn: dn.into() }
    }

    /// Create a new Unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a new ObjectClassViolation error.
    pub fn object_class_violation(dn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ObjectClassViolation {
            dn: dn.into(),
            message: message.into(),
        }
    }

    /// The LDAP result code of the failure.
    pub fn result_code(&self) -> u32 {
        match self {
            DirectoryError::NoSuchObject { .. } => result_code::NO_SUCH_OBJECT,
            DirectoryError::EntryAlreadyExists { .. } => result_code::ENTRY_ALREADY_EXISTS,
            DirectoryError::InvalidDnSyntax { .. } => result_code::INVALID_DN_SYNTAX,
            DirectoryError::InsufficientAccess { .. } => result_code::INSUFFICIENT_ACCESS_RIGHTS,
            DirectoryError::ObjectClassViolation { .. } => result_code::OBJECT_CLASS_VIOLATION,
            DirectoryError::Unavailable { .. } => result_code::UNAVAILABLE,
            DirectoryError::InvalidFilter { .. } => result_code::OTHER,
            DirectoryError::Other { result_code, .. } => *result_code,
        }
    }

    /// HTTP status code for the failure.
    pub fn status_code(&self) -> u16 {
        match self.result_code() {
            result_code::NO_SUCH_OBJECT => 404,
            result_code::ENTRY_ALREADY_EXISTS => 409,
            result_code::INSUFFICIENT_ACCESS_RIGHTS => 403,
            result_code::BUSY | result_code::UNAVAILABLE => 503,
            result_code::INVALID_DN_SYNTAX
            | result_code::OBJECT_CLASS_VIOLATION
            | result_code::UNDEFINED_ATTRIBUTE_TYPE => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_mapping() {
        assert_eq!(DirectoryError::no_such_object("cn=x").status_code(), 404);
        assert_eq!(DirectoryError::entry_already_exists("cn=x").status_code(), 409);
        assert_eq!(
            DirectoryError::InsufficientAccess {
                operation: "add".to_string(),
                dn: "cn=x".to_string()
            }
            .status_code(),
            403
        );
        assert_eq!(DirectoryError::unavailable("down").status_code(), 503);
        assert_eq!(
            DirectoryError::Other {
                result_code: result_code::OPERATIONS_ERROR,
                message: "?".to_string()
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn test_display() {
        let error = DirectoryError::no_such_object("uid=jdoe,dc=example,dc=com");
        assert_eq!(
            error.to_string(),
            "No such object: uid=jdoe,dc=example,dc=com"
        );
    }
}
