use crate::catalog::Catalog;
use crate::filter::FilteredView;

/// Default bin count for the rating histogram.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Upper bound of the rating domain.
const RATING_MAX: f64 = 5.0;

/// Whole-catalog totals for the summary panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSummary {
    pub destinations: usize,
    pub regions: usize,
    pub categories: usize,
}

impl CatalogSummary {
    pub fn of(catalog: &Catalog) -> Self {
        Self {
            destinations: catalog.len(),
            regions: catalog.regions().len(),
            categories: catalog.categories().len(),
        }
    }
}

/// Category frequencies over a filtered view, sorted descending by count.
/// Ties keep first-encounter order. Chart-ready input for a category
/// breakdown (pie/bar).
pub fn category_distribution(view: &FilteredView) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for d in view.records() {
        match counts.iter_mut().find(|(c, _)| *c == d.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((d.category.clone(), 1)),
        }
    }
    // Stable sort keeps encounter order within equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// One fixed-width bucket of the rating histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Bucket the view's ratings into `bins` equal-width bins over [0, 5].
/// A rating of exactly 5.0 lands in the last bin.
pub fn rating_histogram(view: &FilteredView, bins: usize) -> Vec<RatingBin> {
    if bins == 0 {
        return Vec::new();
    }
    let width = RATING_MAX / bins as f64;
    let mut out: Vec<RatingBin> = (0..bins)
        .map(|i| RatingBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for d in view.records() {
        let idx = ((d.rating / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}
