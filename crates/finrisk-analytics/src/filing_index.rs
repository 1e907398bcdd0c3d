//! Sorted-interval lookup over the filing facts of one metric kind.

use finrisk_core::FilingFact;
use time::Date;

/// Reporting window of a duration fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    pub start: Date,
    pub end: Date,
}

/// Which of several windows sharing the earliest containing end to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// Latest start: a quarter rather than the year-to-date window around it.
    Narrowest,
    /// Earliest start: the annual window a fourth quarter is derived from.
    Widest,
}

/// Facts of one metric kind, indexed for period lookups.
///
/// Duration facts are kept sorted by `(end, start)` so that a containment
/// query can binary-search to the first candidate whose window has not ended
/// before the target. Exact-match and end-date queries use the input order.
#[derive(Debug, Clone, Default)]
pub struct FilingIndex {
    by_end: Vec<Period>,
    facts: Vec<FilingFact>,
}

impl FilingIndex {
    pub fn new(facts: &[FilingFact]) -> Self {
        let mut by_end = facts
            .iter()
            .filter_map(|fact| {
                fact.start
                    .filter(|start| *start <= fact.end)
                    .map(|start| Period { start, end: fact.end })
            })
            .collect::<Vec<_>>();
        by_end.sort_by_key(|period| (period.end, period.start));

        Self {
            by_end,
            facts: facts.to_vec(),
        }
    }

    /// Earliest-ending period with `start <= target <= end` and, when a floor
    /// is given, `start >= floor`. Ties on the end are broken by `span`.
    pub fn period_containing(&self, target: Date, floor: Option<Date>, span: Span) -> Option<Period> {
        let first = self.by_end.partition_point(|period| period.end < target);
        let mut candidates = self.by_end[first..].iter().copied().filter(|period| {
            period.start <= target && floor.map_or(true, |floor| period.start >= floor)
        });
        let earliest = candidates.next()?;
        match span {
            Span::Widest => Some(earliest),
            Span::Narrowest => Some(
                candidates
                    .take_while(|period| period.end == earliest.end)
                    .last()
                    .unwrap_or(earliest),
            ),
        }
    }

    /// Value of the first duration fact reported for exactly `period`.
    pub fn value_for(&self, period: Period) -> Option<f64> {
        self.facts
            .iter()
            .find(|fact| fact.start == Some(period.start) && fact.end == period.end)
            .map(|fact| fact.value)
    }

    /// Value of the first fact, instant or duration, ending on `end`.
    pub fn value_ending(&self, end: Date) -> Option<f64> {
        self.facts
            .iter()
            .find(|fact| fact.end == end)
            .map(|fact| fact.value)
    }
}
