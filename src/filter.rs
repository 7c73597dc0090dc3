use std::collections::HashSet;

use crate::catalog::{Catalog, Destination};

/// Filter selections for one user interaction. `None` on an axis means
/// "all": the axis does not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Only destinations in this kabupaten/kota.
    pub region: Option<String>,
    /// Only destinations of this category.
    pub category: Option<String>,
}

impl FilterCriteria {
    /// Criteria matching the whole catalog.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Both predicates are conjunctive: a record must satisfy every
    /// constrained axis.
    fn matches(&self, d: &Destination) -> bool {
        self.region.as_deref().is_none_or(|r| d.region == r)
            && self.category.as_deref().is_none_or(|c| d.category == c)
    }
}

/// The subset of the catalog matching some criteria, plus aggregates
/// derived from it. Borrows the catalog; recomputed fresh on every filter
/// change and never mutated in place.
#[derive(Debug)]
pub struct FilteredView<'a> {
    records: Vec<&'a Destination>,
    avg_rating: Option<f64>,
    top_category: Option<&'a str>,
    active_cluster_count: usize,
}

impl<'a> FilteredView<'a> {
    /// Matching records, in catalog order.
    pub fn records(&self) -> &[&'a Destination] {
        &self.records
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// An empty view is a valid "no results" state, not an error.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean rating over the matches; `None` when the view is empty.
    pub fn avg_rating(&self) -> Option<f64> {
        self.avg_rating
    }

    /// Most frequent category among the matches; `None` when empty.
    pub fn top_category(&self) -> Option<&'a str> {
        self.top_category
    }

    /// Number of distinct cluster ids present among the matches.
    pub fn active_cluster_count(&self) -> usize {
        self.active_cluster_count
    }

    /// Distinct cluster ids present in the view, ascending.
    pub fn cluster_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .records
            .iter()
            .filter_map(|d| d.cluster)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Apply filter criteria to the catalog, producing a view with fresh
/// aggregates. Pure: the catalog is never mutated and repeated calls with
/// different criteria are independent.
pub fn apply<'a>(catalog: &'a Catalog, criteria: &FilterCriteria) -> FilteredView<'a> {
    let records: Vec<&Destination> = catalog
        .records()
        .iter()
        .filter(|d| criteria.matches(d))
        .collect();

    let avg_rating = if records.is_empty() {
        None
    } else {
        Some(records.iter().map(|d| d.rating).sum::<f64>() / records.len() as f64)
    };

    let top_category = modal_category(&records);

    let active_cluster_count = records
        .iter()
        .filter_map(|d| d.cluster)
        .collect::<HashSet<_>>()
        .len();

    FilteredView {
        records,
        avg_rating,
        top_category,
        active_cluster_count,
    }
}

/// Category with the highest frequency. Ties go to the category first
/// encountered in catalog order.
fn modal_category<'a>(records: &[&'a Destination]) -> Option<&'a str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for d in records {
        match counts.iter_mut().find(|(c, _)| *c == d.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((d.category.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for &(category, n) in &counts {
        if best.is_none_or(|(_, bn)| n > bn) {
            best = Some((category, n));
        }
    }
    best.map(|(category, _)| category)
}
