//! A single year's advertisement snapshot.

use car_market_models::{AdRecord, SnapshotYear};

/// An ordered, read-only collection of advertisements from one scrape.
#[derive(Debug, Clone)]
pub struct Snapshot {
    year: SnapshotYear,
    records: Vec<AdRecord>,
}

impl Snapshot {
    /// Wraps `records` in load order.
    #[must_use]
    pub const fn new(year: SnapshotYear, records: Vec<AdRecord>) -> Self {
        Self { year, records }
    }

    /// Which scrape this is.
    #[must_use]
    pub const fn year(&self) -> SnapshotYear {
        self.year
    }

    /// All records in load order.
    #[must_use]
    pub fn records(&self) -> &[AdRecord] {
        &self.records
    }

    /// Iterates records in load order.
    pub fn iter(&self) -> std::slice::Iter<'_, AdRecord> {
        self.records.iter()
    }

    /// Number of advertisements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the snapshot holds no advertisements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a AdRecord;
    type IntoIter = std::slice::Iter<'a, AdRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
