//! LDAP URLs (RFC 4516) as used in `memberURL` values of dynamic groups.

use super::entry::{Entry, is_descendant_or_self, normalize_dn};
use super::errors::DirectoryError;
use super::filter::DirectoryFilter;

/// Search scope of an LDAP URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Base,
    OneLevel,
    #[default]
    Subtree,
}

/// A parsed `ldap://host/base?attributes?scope?filter` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapUrl {
    pub base_dn: String,
    pub scope: SearchScope,
    pub filter: DirectoryFilter,
}

impl LdapUrl {
    /// Parse an LDAP URL. The host part and attribute list are ignored; a
    /// missing filter selects every entry in scope.
    ///
    /// ```rust
    /// use scim_directory::directory::{LdapUrl, SearchScope};
    ///
    /// let url = LdapUrl::parse("ldap:///ou=People,dc=example,dc=com??sub?(l=Sydney)").unwrap();
    /// assert_eq!(url.base_dn, "ou=People,dc=example,dc=com");
    /// assert_eq!(url.scope, SearchScope::Subtree);
    /// ```
    pub fn parse(url: &str) -> Result<Self, DirectoryError> {
        let invalid = |message: &str| DirectoryError::Other {
            result_code: super::errors::result_code::OTHER,
            message: format!("Invalid LDAP URL '{}': {}", url, message),
        };

        let trimmed = url.trim();
        let rest = trimmed
            .get(..7)
            .filter(|scheme| scheme.eq_ignore_ascii_case("ldap://"))
            .map(|_| &trimmed[7..])
            .ok_or_else(|| invalid("expected ldap:// scheme"))?;
        let path = rest.find('/').map(|slash| &rest[slash + 1..]).unwrap_or("");

        let mut parts = path.splitn(4, '?');
        let base_dn = percent_decode(parts.next().unwrap_or(""))
            .ok_or_else(|| invalid("bad percent-encoding in base DN"))?;
        let _attributes = parts.next();
        let scope = match parts.next().unwrap_or("").to_ascii_lowercase().as_str() {
            "" | "sub" => SearchScope::Subtree,
            "one" => SearchScope::OneLevel,
            "base" => SearchScope::Base,
            other => return Err(invalid(&format!("unknown scope '{}'", other))),
        };
        let filter = match parts.next().filter(|f| !f.is_empty()) {
            Some(filter) => {
                let decoded = percent_decode(filter)
                    .ok_or_else(|| invalid("bad percent-encoding in filter"))?;
                DirectoryFilter::parse(&decoded)?
            }
            None => DirectoryFilter::present("objectClass"),
        };

        Ok(Self {
            base_dn,
            scope,
            filter,
        })
    }

    /// Whether `entry` is in scope and matches the filter.
    pub fn matches(&self, entry: &Entry) -> bool {
        self.in_scope(entry.dn()) && self.filter.matches(entry)
    }

    /// Whether a DN falls within the URL's base and scope.
    pub fn in_scope(&self, dn: &str) -> bool {
        match self.scope {
            SearchScope::Base => normalize_dn(dn) == normalize_dn(&self.base_dn),
            SearchScope::OneLevel => match normalize_dn(dn).split_once(',') {
                Some((_, parent)) => parent == normalize_dn(&self.base_dn),
                None => false,
            },
            SearchScope::Subtree => is_descendant_or_self(dn, &self.base_dn),
        }
    }
}

fn percent_decode(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}
