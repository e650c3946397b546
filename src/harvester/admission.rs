//! Deduplication and cap enforcement
//!
//! Tracks which external ids a run has already admitted for detail fetching
//! and how many cap slots are in use. Owned by the coordinating task alone;
//! every mutation happens before a page's fan-out starts, or after it settles.

use crate::harvester::source::VacancySource;
use crate::models::ItemSummary;
use std::collections::HashSet;

/// Why an item was or was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Ineligible,
    Duplicate,
    CapReached,
}

#[derive(Debug)]
pub struct AdmissionControl {
    seen: HashSet<String>,
    admitted: usize,
    limit: usize,
}

impl AdmissionControl {
    pub fn new(limit: usize) -> Self {
        Self {
            seen: HashSet::new(),
            admitted: 0,
            limit,
        }
    }

    /// True once every cap slot is taken
    pub fn is_full(&self) -> bool {
        self.admitted >= self.limit
    }

    pub fn admitted(&self) -> usize {
        self.admitted
    }

    /// Decides whether `item` gets a detail fetch, taking a cap slot if so
    pub fn admit(&mut self, source: &dyn VacancySource, item: &ItemSummary) -> Admission {
        if self.is_full() {
            return Admission::CapReached;
        }

        if !source.admits(item) {
            return Admission::Ineligible;
        }

        if !self.seen.insert(item.id.clone()) {
            tracing::warn!("Vacancy {} data is already gathered", item.id);
            return Admission::Duplicate;
        }

        self.admitted += 1;
        Admission::Admitted
    }

    /// Returns a slot taken by an item that produced no record
    ///
    /// The id stays in the seen-set.
    pub fn give_back(&mut self) {
        self.admitted = self.admitted.saturating_sub(1);
    }

    /// Admits items of one page in listing order, stopping at the cap
    pub fn admit_page(
        &mut self,
        source: &dyn VacancySource,
        items: Vec<ItemSummary>,
    ) -> Vec<ItemSummary> {
        let mut batch = Vec::new();
        for item in items {
            match self.admit(source, &item) {
                Admission::Admitted => batch.push(item),
                Admission::CapReached => break,
                Admission::Ineligible | Admission::Duplicate => {}
            }
        }
        batch
    }
}
