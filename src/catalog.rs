//! Where loaded records end up.
//!
//! The loader itself never touches the catalog. Records reach it through
//! the parser sessions of the load workers, which call [`Catalog::insert`]
//! concurrently from several threads. Implementations therefore have to be
//! `Send` and `Sync` and deal with concurrent insertion themselves.

use core::fmt;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use domain::base::iana::{Class, Rtype};
use domain::base::name::{Name, ToName};
use domain::zonefile::inplace::ScannedRecord;
use parking_lot::RwLock;

//------------ Type Aliases --------------------------------------------------

/// The type used for owner names in the catalog.
pub type StoredName = Name<Bytes>;

//------------ Catalog -------------------------------------------------------

/// A store for records read from zone files.
pub trait Catalog: Send + Sync {
    /// Adds a record to the catalog.
    fn insert(&self, record: ScannedRecord) -> Result<(), CatalogError>;
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn insert(&self, record: ScannedRecord) -> Result<(), CatalogError> {
        (**self).insert(record)
    }
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn insert(&self, record: ScannedRecord) -> Result<(), CatalogError> {
        (**self).insert(record)
    }
}

//------------ MemoryCatalog -------------------------------------------------

/// An in-memory catalog grouping records by owner name.
///
/// The owner names are spread over a number of shards, each behind its own
/// lock, so that insertions from different workers rarely have to wait for
/// each other. The shard count follows the configured number of insertion
/// threads.
pub struct MemoryCatalog {
    /// The class of all records in the catalog.
    class: Class,

    /// The shards.
    shards: Box<[RwLock<Shard>]>,

    /// The number of records in all shards.
    len: AtomicUsize,
}

/// A single shard of a memory catalog.
type Shard = HashMap<StoredName, Vec<ScannedRecord>>;

impl MemoryCatalog {
    /// Creates a new catalog for class IN with a single shard.
    pub fn new() -> Self {
        Self::with_shards(1)
    }

    /// Creates a new catalog for class IN with the given number of shards.
    ///
    /// A value of zero is treated as one.
    pub fn with_shards(shards: usize) -> Self {
        Self::with_class(Class::IN, shards)
    }

    /// Creates a new catalog for the given class.
    pub fn with_class(class: Class, shards: usize) -> Self {
        MemoryCatalog {
            class,
            shards: (0..shards.max(1))
                .map(|_| RwLock::new(HashMap::new()))
                .collect(),
            len: AtomicUsize::new(0),
        }
    }

    /// Returns the class of the catalog.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the total number of records.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns whether the catalog has no records at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of distinct owner names.
    pub fn owner_count(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Returns the records of the given type at the given owner name.
    ///
    /// Records are returned in the order they were inserted. Since several
    /// workers may insert records for the same owner, that order is only
    /// stable for records coming from the same file.
    pub fn lookup(
        &self,
        owner: &impl ToName,
        rtype: Rtype,
    ) -> Vec<ScannedRecord> {
        let owner: StoredName = owner.to_name();
        self.shard(&owner)
            .read()
            .get(&owner)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| record.rtype() == rtype)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the shard responsible for the given owner.
    fn shard(&self, owner: &StoredName) -> &RwLock<Shard> {
        let mut hasher = DefaultHasher::new();
        owner.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for MemoryCatalog {
    fn insert(&self, record: ScannedRecord) -> Result<(), CatalogError> {
        if record.class() != self.class {
            return Err(CatalogError::ClassMismatch {
                found: record.class(),
                expected: self.class,
            });
        }
        let owner: StoredName = record.owner().to_name();
        self.shard(&owner)
            .write()
            .entry(owner)
            .or_default()
            .push(record);
        self.len.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl fmt::Debug for MemoryCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCatalog")
            .field("class", &self.class)
            .field("shards", &self.shards.len())
            .field("len", &self.len())
            .finish()
    }
}

//------------ DiscardCatalog ------------------------------------------------

/// A catalog that drops all records.
///
/// This is used to measure how fast zone files can be read and parsed
/// without the cost of storing the result.
#[derive(Debug, Default)]
pub struct DiscardCatalog {
    /// The number of records offered.
    seen: AtomicUsize,
}

impl DiscardCatalog {
    /// Creates a new discarding catalog.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the number of records that were offered for insertion.
    pub fn seen(&self) -> usize {
        self.seen.load(Ordering::Relaxed)
    }
}

impl Catalog for DiscardCatalog {
    fn insert(&self, _record: ScannedRecord) -> Result<(), CatalogError> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

//------------ CatalogError --------------------------------------------------

/// A record was rejected by a catalog.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CatalogError {
    /// The class of the record differs from the class of the catalog.
    ClassMismatch {
        /// The class of the rejected record.
        found: Class,

        /// The class of the catalog.
        expected: Class,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::ClassMismatch { found, expected } => {
                write!(
                    f,
                    "record class {found} does not match catalog class {expected}"
                )
            }
        }
    }
}

impl std::error::Error for CatalogError {}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use core::str::FromStr;
    use domain::zonefile::inplace::{Entry, Zonefile};
    use std::thread;

    fn records(text: &str) -> Vec<ScannedRecord> {
        let mut zonefile = Zonefile::from(text);
        zonefile.set_origin(Name::root_bytes());
        zonefile
            .map(|entry| match entry.unwrap() {
                Entry::Record(record) => record,
                entry => panic!("unexpected entry {entry:?}"),
            })
            .collect()
    }

    #[test]
    fn insert_and_lookup() {
        let catalog = MemoryCatalog::with_shards(4);
        for record in records(
            "example.com. 3600 IN A 192.0.2.1\n\
             EXAMPLE.com. 3600 IN A 192.0.2.2\n\
             example.com. 3600 IN MX 10 mail.example.com.\n\
             www.example.com. 60 IN AAAA 2001:db8::1\n",
        ) {
            catalog.insert(record).unwrap();
        }

        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.owner_count(), 2);
        assert_eq!(catalog.shard_count(), 4);

        let owner = Name::<Vec<u8>>::from_str("example.com.").unwrap();
        assert_eq!(catalog.lookup(&owner, Rtype::A).len(), 2);
        assert_eq!(catalog.lookup(&owner, Rtype::MX).len(), 1);
        assert!(catalog.lookup(&owner, Rtype::AAAA).is_empty());
    }

    #[test]
    fn rejects_other_classes() {
        let catalog = MemoryCatalog::new();
        let record = records("version.bind. 0 CH TXT \"1.0\"\n").remove(0);
        assert_eq!(
            catalog.insert(record),
            Err(CatalogError::ClassMismatch {
                found: Class::CH,
                expected: Class::IN
            })
        );
        assert!(catalog.is_empty());
    }

    #[test]
    fn concurrent_inserts() {
        let catalog = MemoryCatalog::with_shards(3);
        thread::scope(|scope| {
            for worker in 0..4 {
                let catalog = &catalog;
                scope.spawn(move || {
                    let text: String = (0..50)
                        .map(|i| format!("h{i}.w{worker}.example. 60 IN A 192.0.2.{i}\n"))
                        .collect();
                    for record in records(&text) {
                        catalog.insert(record).unwrap();
                    }
                });
            }
        });
        assert_eq!(catalog.len(), 200);
        assert_eq!(catalog.owner_count(), 200);
    }

    #[test]
    fn discard_counts() {
        let catalog = DiscardCatalog::new();
        for record in records("a. 1 IN A 192.0.2.1\nb. 1 IN A 192.0.2.2\n") {
            catalog.insert(record).unwrap();
        }
        assert_eq!(catalog.seen(), 2);
    }
}
