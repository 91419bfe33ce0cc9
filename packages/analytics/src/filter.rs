//! Criteria filtering over one snapshot.

use car_market::SnapshotStore;
use car_market_models::{AdRecord, FilterCriteria, SnapshotYear};

/// Read-only selection of advertisements from one snapshot.
///
/// Records are borrowed from the store and keep the snapshot's order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    year: SnapshotYear,
    records: Vec<&'a AdRecord>,
}

impl<'a> FilteredView<'a> {
    /// Wraps an already-selected set of records.
    #[must_use]
    pub const fn new(year: SnapshotYear, records: Vec<&'a AdRecord>) -> Self {
        Self { year, records }
    }

    /// Snapshot the records were taken from.
    #[must_use]
    pub const fn year(&self) -> SnapshotYear {
        self.year
    }

    /// Selected records in snapshot order.
    #[must_use]
    pub fn records(&self) -> &[&'a AdRecord] {
        &self.records
    }

    /// Iterates the selected records in snapshot order.
    pub fn iter(&self) -> impl Iterator<Item = &'a AdRecord> + '_ {
        self.records.iter().copied()
    }

    /// Number of selected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The selection re-ordered by advertisement id.
    #[must_use]
    pub fn sorted_by_id(&self) -> Vec<&'a AdRecord> {
        let mut sorted = self.records.clone();
        sorted.sort_by_key(|record| record.ad_id);
        sorted
    }
}

/// Selects the records of `criteria.year` that satisfy every active
/// criterion.
///
/// An empty selection is a valid result.
#[must_use]
pub fn apply_filters<'a>(store: &'a SnapshotStore, criteria: &FilterCriteria) -> FilteredView<'a> {
    let snapshot = store.snapshot(criteria.year);
    let records: Vec<&AdRecord> = snapshot
        .iter()
        .filter(|record| criteria.matches(record))
        .collect();

    log::debug!(
        "Filter {:?} kept {} of {} advertisements in {}",
        criteria,
        records.len(),
        snapshot.len(),
        criteria.year
    );

    FilteredView::new(criteria.year, records)
}
