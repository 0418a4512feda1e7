//! Query resolution against one package snapshot
//!
//! Three strategies, from strict to loose:
//! - [`Resolver::exists`] - normalized equality on any of a record's names
//! - [`Resolver::find_by_title`] - exact, normalized, then substring match
//! - [`Resolver::closest_package`] - bounded edit distance over candidate names
//!
//! A resolver borrows the snapshot it was created from, so a lookup sees
//! one consistent listing even if the cache refreshes meanwhile.

use tracing::trace;

use crate::catalog::PackageRecord;
use crate::matching::{distance, fuzzy_key, normalize, tokens};

/// Highest accepted `distance / longer normalized length` for a fuzzy hit
pub const MAX_NORMALIZED_DISTANCE: f64 = 0.25;

/// Best fuzzy match for a query
#[derive(Debug, Clone, Copy)]
pub struct ClosestPackage<'a> {
    pub distance: usize,
    pub record: &'a PackageRecord,
}

/// Display name of the best fuzzy match
///
/// `title` is empty when nothing matched closely enough.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosestTitle {
    pub distance: usize,
    pub title: String,
}

impl ClosestTitle {
    pub fn is_hit(&self) -> bool {
        !self.title.is_empty()
    }
}

pub struct Resolver<'a> {
    records: &'a [PackageRecord],
}

impl<'a> Resolver<'a> {
    pub fn new(records: &'a [PackageRecord]) -> Self {
        Self { records }
    }

    /// Whether any record is known under this name
    pub fn exists(&self, query: &str) -> bool {
        let want = normalize(query);
        if want.is_empty() {
            return false;
        }

        self.records.iter().any(|record| names_match(record, &want))
    }

    /// First record whose name or description matches `title`
    ///
    /// Per record, in snapshot order: case-insensitive equality on `name`,
    /// normalized equality on `name`, then case-insensitive containment in
    /// `name` or `description`.
    pub fn find_by_title(&self, title: &str) -> Option<&'a PackageRecord> {
        let want = title.trim().to_lowercase();
        if want.is_empty() {
            return None;
        }
        let want_normalized = normalize(title);

        self.records.iter().find(|record| {
            let name = record.name();
            name.trim().to_lowercase() == want
                || (!want_normalized.is_empty() && normalize(name) == want_normalized)
                || name.to_lowercase().contains(&want)
                || record.description().to_lowercase().contains(&want)
        })
    }

    /// Record with the smallest edit distance to `query`
    ///
    /// Every candidate name of every record is scored; equal distances
    /// prefer the shorter candidate. The winner is rejected when it is too
    /// far relative to its length, or, for one-character queries, when the
    /// character is not a whole token of the winning name.
    pub fn closest_package(&self, query: &str) -> Option<ClosestPackage<'a>> {
        let want = fuzzy_key(query);
        let want_normalized = normalize(&want);
        if want_normalized.is_empty() {
            return None;
        }

        let mut best: Option<(usize, &'a PackageRecord, String)> = None;
        for record in self.records {
            for raw in record.candidate_names() {
                let candidate = fuzzy_key(raw);
                if candidate.is_empty() {
                    continue;
                }

                let bound = best.as_ref().map_or(usize::MAX, |(d, _, _)| *d);
                let d = distance(&want, &candidate, bound);
                let better = match &best {
                    None => true,
                    Some((best_d, _, best_candidate)) => {
                        d < *best_d
                            || (d == *best_d
                                && candidate.chars().count() < best_candidate.chars().count())
                    }
                };
                if better {
                    best = Some((d, record, candidate));
                }
            }
        }

        let (distance, record, candidate) = best?;
        trace!(query, candidate = %candidate, distance, "Closest candidate");

        if want_normalized.len() == 1 {
            return tokens(&candidate)
                .any(|t| t.eq_ignore_ascii_case(&want_normalized))
                .then_some(ClosestPackage { distance, record });
        }

        let longest = want_normalized.len().max(normalize(&candidate).len()).max(1);
        let ratio = distance as f64 / longest as f64;
        (ratio <= MAX_NORMALIZED_DISTANCE).then_some(ClosestPackage { distance, record })
    }

    /// Display name of [`Self::closest_package`], preferring `name`
    pub fn closest_title(&self, query: &str) -> ClosestTitle {
        self.closest_package(query)
            .and_then(|hit| {
                hit.record
                    .candidate_names()
                    .find(|name| !name.trim().is_empty())
                    .map(|title| ClosestTitle {
                        distance: hit.distance,
                        title: title.to_string(),
                    })
            })
            .unwrap_or_default()
    }
}

fn names_match(record: &PackageRecord, want: &str) -> bool {
    normalize(record.name()) == want
        || normalize(record.full_name()) == want
        || record
            .suffix_after_owner()
            .map(normalize)
            .is_some_and(|suffix| suffix == want)
        || record
            .first_version()
            .is_some_and(|v| normalize(v.name()) == want)
        || tokens(record.name()).any(|t| normalize(t) == want)
}
