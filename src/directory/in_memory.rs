//! In-memory directory implementation.
//!
//! Entries are kept in a map keyed by normalized DN behind a tokio
//! `RwLock`. The directory maintains `createTimestamp`, `modifyTimestamp`
//! and `entryUUID` like a real server; timestamps are generalized time with
//! millisecond precision and strictly increase across writes.

use super::entry::{Entry, Modification, is_descendant_or_self, normalize_dn};
use super::errors::DirectoryError;
use super::{DirectoryAttribute, DirectoryReader, DirectoryResult, DirectoryWriter, SearchRequest};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, trace};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

pub const CREATE_TIMESTAMP: &str = "createTimestamp";
pub const MODIFY_TIMESTAMP: &str = "modifyTimestamp";
pub const ENTRY_UUID: &str = "entryUUID";

/// Format a timestamp as LDAP generalized time with milliseconds.
pub fn format_generalized_time(at: &DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S%.3fZ").to_string()
}

#[derive(Debug, Default)]
struct DirectoryState {
    entries: BTreeMap<String, Entry>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl DirectoryState {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::milliseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }
}

/// Thread-safe in-memory directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
    read_only: Arc<AtomicBool>,
}

impl InMemoryDirectory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write with insufficient access rights.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, AtomicOrdering::SeqCst);
    }

    /// Number of entries held.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Clear all entries (useful for testing).
    pub async fn clear(&self) {
        self.state.write().await.entries.clear();
    }

    fn check_writable(&self, operation: &str, dn: &str) -> DirectoryResult<()> {
        if self.read_only.load(AtomicOrdering::SeqCst) {
            return Err(DirectoryError::InsufficientAccess {
                operation: operation.to_string(),
                dn: dn.to_string(),
            });
        }
        Ok(())
    }

    fn check_dn(dn: &str) -> DirectoryResult<()> {
        let valid = !dn.trim().is_empty()
            && dn
                .split(',')
                .all(|rdn| {
                    rdn.split_once('=')
                        .is_some_and(|(t, v)| !t.trim().is_empty() && !v.trim().is_empty())
                });
        if valid {
            Ok(())
        } else {
            Err(DirectoryError::InvalidDnSyntax { dn: dn.to_string() })
        }
    }
}

fn compare_entries(left: &Entry, right: &Entry, attribute: &str) -> Ordering {
    let l = left.attribute_value(attribute).map(|v| v.to_lowercase());
    let r = right.attribute_value(attribute).map(|v| v.to_lowercase());
    match (l, r) {
        (Some(l), Some(r)) => l.cmp(&r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl DirectoryReader for InMemoryDirectory {
    async fn get_entry(&self, dn: &str, attributes: &[String]) -> DirectoryResult<Option<Entry>> {
        let state = self.state.read().await;
        let entry = state
            .entries
            .get(&normalize_dn(dn))
            .map(|entry| entry.select(attributes));
        debug!("Directory get {} (found: {})", dn, entry.is_some());
        Ok(entry)
    }

    async fn search(&self, request: &SearchRequest) -> DirectoryResult<Vec<Entry>> {
        let state = self.state.read().await;
        let mut matched: Vec<&Entry> = state
            .entries
            .values()
            .filter(|entry| is_descendant_or_self(entry.dn(), &request.base_dn))
            .filter(|entry| request.filter.matches(entry))
            .collect();

        if let Some(sort) = &request.sort {
            // entries without the sort attribute stay last in either direction
            matched.sort_by(|a, b| {
                let ordering = compare_entries(a, b, &sort.attribute);
                let present = (a.has_attribute(&sort.attribute), b.has_attribute(&sort.attribute));
                match present {
                    (true, true) if sort.reverse => ordering.reverse(),
                    _ => ordering,
                }
            });
        }

        if let Some(limit) = request.size_limit {
            matched.truncate(limit);
        }

        debug!(
            "Directory search base={} filter={} returned {} entries",
            request.base_dn,
            request.filter,
            matched.len()
        );
        Ok(matched
            .into_iter()
            .map(|entry| entry.select(&request.attributes))
            .collect())
    }
}

#[async_trait]
impl DirectoryWriter for InMemoryDirectory {
    async fn add(&self, mut entry: Entry) -> DirectoryResult<Entry> {
        self.check_writable("add", entry.dn())?;
        Self::check_dn(entry.dn())?;

        let mut state = self.state.write().await;
        let key = normalize_dn(entry.dn());
        if state.entries.contains_key(&key) {
            return Err(DirectoryError::entry_already_exists(entry.dn()));
        }
        if entry.object_classes().is_empty() {
            return Err(DirectoryError::object_class_violation(
                entry.dn(),
                "entry has no objectClass",
            ));
        }

        let now = format_generalized_time(&state.next_timestamp());
        if !entry.has_attribute(CREATE_TIMESTAMP) {
            entry.set_attribute(DirectoryAttribute::from_strings(CREATE_TIMESTAMP, [&now]));
        }
        if !entry.has_attribute(MODIFY_TIMESTAMP) {
            let created = entry.attribute_values(CREATE_TIMESTAMP);
            entry.set_attribute(DirectoryAttribute::from_strings(MODIFY_TIMESTAMP, created));
        }
        if !entry.has_attribute(ENTRY_UUID) {
            entry.set_attribute(DirectoryAttribute::from_strings(
                ENTRY_UUID,
                [uuid::Uuid::new_v4().to_string()],
            ));
        }

        info!("Directory add {}", entry.dn());
        state.entries.insert(key, entry.clone());
        Ok(entry)
    }

    async fn modify(&self, dn: &str, modifications: &[Modification]) -> DirectoryResult<Entry> {
        self.check_writable("modify", dn)?;

        let mut state = self.state.write().await;
        let now = format_generalized_time(&state.next_timestamp());
        let entry = state
            .entries
            .get_mut(&normalize_dn(dn))
            .ok_or_else(|| DirectoryError::no_such_object(dn))?;

        let mut updated = entry.clone();
        updated.apply_modifications(modifications)?;
        if updated.object_classes().is_empty() {
            return Err(DirectoryError::object_class_violation(dn, "objectClass removed"));
        }
        updated.set_attribute(DirectoryAttribute::from_strings(MODIFY_TIMESTAMP, [&now]));

        for modification in modifications {
            trace!("Directory modify {} {}", dn, modification);
        }
        info!("Directory modify {} ({} changes)", dn, modifications.len());
        *entry = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, dn: &str) -> DirectoryResult<()> {
        self.check_writable("delete", dn)?;

        let mut state = self.state.write().await;
        let key = normalize_dn(dn);
        let has_children = state
            .entries
            .keys()
            .any(|other| other != &key && other.ends_with(&format!(",{}", key)));
        if has_children {
            return Err(DirectoryError::Other {
                result_code: 66,
                message: format!("{} has subordinate entries", dn),
            });
        }
        state
            .entries
            .remove(&key)
            .ok_or_else(|| DirectoryError::no_such_object(dn))?;
        info!("Directory delete {}", dn);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryFilter, DirectorySort};

    fn person(uid: &str, sn: &str) -> Entry {
        let mut entry = Entry::new(format!("uid={},ou=people,dc=example,dc=com", uid));
        entry.add_attribute(DirectoryAttribute::from_strings(
            "objectClass",
            ["top", "inetOrgPerson"],
        ));
        entry.add_attribute(DirectoryAttribute::from_strings("uid", [uid]));
        entry.add_attribute(DirectoryAttribute::from_strings("sn", [sn]));
        entry
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let directory = InMemoryDirectory::new();
        let added = directory.add(person("bjensen", "Jensen")).await.unwrap();
        assert!(added.has_attribute(CREATE_TIMESTAMP));
        assert!(added.has_attribute(ENTRY_UUID));
        assert_eq!(
            added.attribute_value(CREATE_TIMESTAMP),
            added.attribute_value(MODIFY_TIMESTAMP)
        );

        let fetched = directory
            .get_entry("UID=bjensen, ou=People, dc=example, dc=com", &["sn".to_string()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.attribute_value("sn").as_deref(), Some("Jensen"));
        assert!(!fetched.has_attribute("uid"));
    }

    #[tokio::test]
    async fn test_add_duplicate_fails() {
        let directory = InMemoryDirectory::new();
        directory.add(person("bjensen", "Jensen")).await.unwrap();
        let result = directory.add(person("bjensen", "Jensen")).await;
        assert!(matches!(result, Err(DirectoryError::EntryAlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_modify_advances_timestamp() {
        let directory = InMemoryDirectory::new();
        let added = directory.add(person("bjensen", "Jensen")).await.unwrap();
        let modified = directory
            .modify(
                added.dn(),
                &[Modification::replace(DirectoryAttribute::from_strings("sn", ["Smith"]))],
            )
            .await
            .unwrap();
        assert_eq!(modified.attribute_value("sn").as_deref(), Some("Smith"));
        assert!(
            modified.attribute_value(MODIFY_TIMESTAMP) > added.attribute_value(MODIFY_TIMESTAMP)
        );

        let missing = directory.modify("uid=nobody,dc=example,dc=com", &[]).await;
        assert!(matches!(missing, Err(DirectoryError::NoSuchObject { .. })));
    }

    #[tokio::test]
    async fn test_search_sort_and_limit() {
        let directory = InMemoryDirectory::new();
        for (uid, sn) in [("c", "Charlie"), ("a", "Alpha"), ("b", "Bravo")] {
            directory.add(person(uid, sn)).await.unwrap();
        }

        let request =
            SearchRequest::new("dc=example,dc=com", DirectoryFilter::present("objectClass"))
                .with_sort(Some(DirectorySort::descending("sn")))
            .with_size_limit(Some(2));
        let found = directory.search(&request).await.unwrap();
        let names: Vec<_> = found.iter().filter_map(|e| e.attribute_value("sn")).collect();
        assert_eq!(names, vec!["Charlie", "Bravo"]);

        let outside = SearchRequest::new(
            "ou=groups,dc=example,dc=com",
            DirectoryFilter::present("objectClass"),
        );
        assert!(directory.search(&outside).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let directory = InMemoryDirectory::new();
        directory.set_read_only(true);
        let result = directory.add(person("bjensen", "Jensen")).await;
        assert_eq!(result.unwrap_err().status_code(), 403);
    }

    #[tokio::test]
    async fn test_delete() {
        let directory = InMemoryDirectory::new();
        let added = directory.add(person("bjensen", "Jensen")).await.unwrap();
        directory.delete(added.dn()).await.unwrap();
        assert!(directory.is_empty().await);
        assert!(directory.delete(added.dn()).await.is_err());
    }
}
