//! Consistency check of directory tables against the segment store.

use crate::cache::SharedCache;
use crate::error::{CacheError, CacheResult};
use crate::table::{DirectoryTable, NamespaceTable, ROOT_TABLE_ID};
use shmcache_codec::SegmentKind;
use shmcache_storage::SegmentId;
use std::collections::BTreeMap;
use std::fmt;

/// One inconsistency found by [`SharedCache::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// The root table exists but does not decode.
    RootUnreadable {
        /// Decoder message.
        message: String,
    },
    /// A table entry points at a segment that does not exist.
    Dangling {
        /// Entry that holds the reference.
        owner: String,
        /// Missing segment.
        id: SegmentId,
    },
    /// A segment holds a different kind than its reference implies.
    WrongKind {
        /// Segment checked.
        id: SegmentId,
        /// Kind implied by the reference.
        expected: SegmentKind,
        /// Kind found in the envelope.
        found: SegmentKind,
    },
    /// A segment exists but its envelope cannot be read.
    Unreadable {
        /// Segment checked.
        id: SegmentId,
        /// Error message.
        message: String,
    },
    /// A segment exists that no table references.
    ///
    /// Expected after a shallow destroy of a cache with namespaces.
    Orphan {
        /// Unreferenced segment.
        id: SegmentId,
    },
}

impl Finding {
    /// Returns true for findings that indicate damage rather than leftovers.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        !matches!(self, Self::Orphan { .. })
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootUnreadable { message } => write!(f, "root table unreadable: {message}"),
            Self::Dangling { owner, id } => write!(f, "{owner} points at missing {id}"),
            Self::WrongKind { id, expected, found } => {
                write!(f, "{id} holds a {found}, expected a {expected}")
            }
            Self::Unreadable { id, message } => write!(f, "{id} unreadable: {message}"),
            Self::Orphan { id } => write!(f, "{id} is not referenced by any table"),
        }
    }
}

/// Outcome of [`SharedCache::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Segments inspected.
    pub segments_checked: usize,
    /// Everything found, in segment order.
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    /// Returns true if no finding indicates damage.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !self.findings.iter().any(Finding::is_error)
    }
}

impl SharedCache {
    /// Checks every table reference and every stored segment.
    ///
    /// Runs under the store lock and modifies nothing.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself cannot be listed or read.
    pub fn verify(&self) -> CacheResult<VerifyReport> {
        self.locked(|dir| {
            let store = dir.segments();
            let present = store.list()?;
            let mut report = VerifyReport {
                segments_checked: present.len(),
                findings: Vec::new(),
            };

            let root = match dir.load_root() {
                Ok(root) => root.unwrap_or_default(),
                Err(CacheError::Codec(e)) => {
                    report.findings.push(Finding::RootUnreadable {
                        message: e.to_string(),
                    });
                    return Ok(report);
                }
                Err(e) => return Err(e),
            };

            let mut expected: BTreeMap<SegmentId, (SegmentKind, String)> = BTreeMap::new();
            if store.exists(ROOT_TABLE_ID)? {
                expected.insert(ROOT_TABLE_ID, (SegmentKind::RootTable, "root".to_string()));
            }
            for (name, &id) in root.names() {
                expected.insert(SegmentId::new(id), (SegmentKind::Value, format!("name {name:?}")));
            }
            for (token, entry) in root.namespaces() {
                expected.insert(
                    entry.table_id(),
                    (SegmentKind::NamespaceTable, format!("namespace {token}")),
                );
                if let Ok(Some(table)) = dir.load::<NamespaceTable>(entry.table_id()) {
                    for (name, &id) in table.names() {
                        expected.insert(
                            SegmentId::new(id),
                            (SegmentKind::Value, format!("{token} name {name:?}")),
                        );
                    }
                }
            }

            for (&id, (kind, owner)) in &expected {
                let Some(bytes) = store.read_optional(id)? else {
                    report.findings.push(Finding::Dangling {
                        owner: owner.clone(),
                        id,
                    });
                    continue;
                };
                match shmcache_codec::peek_kind(&bytes) {
                    Ok(found) if found == *kind => {}
                    Ok(found) => report.findings.push(Finding::WrongKind {
                        id,
                        expected: *kind,
                        found,
                    }),
                    Err(e) => report.findings.push(Finding::Unreadable {
                        id,
                        message: e.to_string(),
                    }),
                }
            }

            for id in present {
                if !expected.contains_key(&id) {
                    report.findings.push(Finding::Orphan { id });
                }
            }

            Ok(report)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use shmcache_storage::{InMemorySegmentStore, Permissions};

    #[test]
    fn healthy_cache_verifies() {
        let cache = SharedCache::open_in_memory().unwrap();
        cache.save("a", &1u8, None).unwrap();
        cache.save("b", &2u8, Some("pw")).unwrap();

        let report = cache.verify().unwrap();
        assert_eq!(report.segments_checked, 4);
        assert!(report.findings.is_empty());
        assert!(report.is_ok());
    }

    #[test]
    fn shallow_destroy_leaves_orphans() {
        let cache = SharedCache::open_in_memory().unwrap();
        cache.save("b", &2u8, Some("pw")).unwrap();
        cache.destroy_all().unwrap();

        let report = cache.verify().unwrap();
        assert_eq!(report.findings.len(), 1);
        assert!(matches!(report.findings[0], Finding::Orphan { .. }));
        assert!(report.is_ok());
    }

    #[test]
    fn deep_destroy_leaves_nothing() {
        let config = Config::new().deep_destroy(true);
        let cache = SharedCache::with_store(InMemorySegmentStore::new(), config).unwrap();
        cache.save("b", &2u8, Some("pw")).unwrap();
        cache.destroy(None).unwrap();

        let report = cache.verify().unwrap();
        assert_eq!(report.segments_checked, 0);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn dangling_and_wrong_kind_reported() {
        let cache = SharedCache::open_in_memory().unwrap();
        let a = cache.save("a", &1u8, None).unwrap();
        let b = cache.save("b", &1u8, None).unwrap();

        cache.store().delete(a).unwrap();
        let table = shmcache_codec::encode(SegmentKind::NamespaceTable, &NamespaceTable::default()).unwrap();
        cache.store().write(b, &table, Permissions::DEFAULT).unwrap();

        let report = cache.verify().unwrap();
        assert!(!report.is_ok());
        assert!(report.findings.contains(&Finding::Dangling {
            owner: "name \"a\"".to_string(),
            id: a,
        }));
        assert!(report.findings.contains(&Finding::WrongKind {
            id: b,
            expected: SegmentKind::Value,
            found: SegmentKind::NamespaceTable,
        }));
    }

    #[test]
    fn corrupt_root_reported() {
        let cache = SharedCache::open_in_memory().unwrap();
        cache
            .store()
            .write(ROOT_TABLE_ID, b"not an envelope", Permissions::DEFAULT)
            .unwrap();

        let report = cache.verify().unwrap();
        assert!(matches!(report.findings[..], [Finding::RootUnreadable { .. }]));
        assert!(!report.is_ok());
    }
}
