//! Id to display-name lookup tables (regions, brands, models).

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Read-only id → name mapping that remembers source order.
///
/// Source order is what the dashboard dropdowns list; lookups go through
/// the id index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: Vec<(i32, String)>,
    index: BTreeMap<i32, usize>,
}

impl LookupTable {
    /// Builds a table from `(id, name)` pairs. The first name for a
    /// duplicated id wins.
    pub fn from_entries(entries: impl IntoIterator<Item = (i32, String)>) -> Self {
        let mut table = Self::default();
        for (id, name) in entries {
            if table.index.contains_key(&id) {
                log::debug!("Ignoring duplicate lookup id {id} ({name})");
                continue;
            }
            table.index.insert(id, table.entries.len());
            table.entries.push((id, name));
        }
        table
    }

    /// The name for `id`, if present.
    #[must_use]
    pub fn name(&self, id: i32) -> Option<&str> {
        self.index.get(&id).map(|&i| self.entries[i].1.as_str())
    }

    /// The name for `id`, or `"Unknown (<id>)"` when the id is not in the
    /// table.
    #[must_use]
    pub fn name_or_unknown(&self, id: i32) -> Cow<'_, str> {
        self.name(id)
            .map_or_else(|| Cow::Owned(format!("Unknown ({id})")), Cow::Borrowed)
    }

    /// Returns `true` if `id` has a name.
    #[must_use]
    pub fn contains(&self, id: i32) -> bool {
        self.index.contains_key(&id)
    }

    /// `(id, name)` pairs in source order.
    #[must_use]
    pub fn options(&self) -> &[(i32, String)] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
