use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// A single tourist destination record.
///
/// Records are validated at load time; a `Destination` held by a
/// [`Catalog`] always has finite numerics, a rating within [0, 5], and
/// coordinates within valid ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    /// Unique record id.
    pub id: u32,
    pub name: String,
    /// Destination category, e.g. "Pantai".
    pub category: String,
    /// Kabupaten/kota the destination belongs to, e.g. "Badung".
    pub region: String,
    /// Visitor rating, 0–5.
    pub rating: f64,
    pub preference_score: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Cluster index assigned by k-means (`None` until assignment has run).
    pub cluster: Option<usize>,
}

/// Errors raised while loading the catalog. Any malformed or invalid row
/// fails the whole load; there is no per-record skip.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog row: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid record {id} ({name}): {reason}")]
    InvalidRecord {
        id: u32,
        name: String,
        reason: String,
    },
    #[error("duplicate destination id {0}")]
    DuplicateId(u32),
    #[error("catalog file contains no records")]
    Empty,
}

/// Row shape of the external catalog CSV.
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: u32,
    name: String,
    category: String,
    region: String,
    rating: f64,
    preference_score: f64,
    latitude: f64,
    longitude: f64,
}

/// Load destination records from a CSV file with header
/// `id,name,category,region,rating,preference_score,latitude,longitude`.
///
/// Returned records have no cluster assignment yet; run
/// [`crate::cluster::assign`] before building the serving [`Catalog`].
pub fn load_csv(path: &Path) -> Result<Vec<Destination>, CatalogError> {
    let file = fs::File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut seen_ids = HashSet::new();
    let mut out = Vec::new();
    for row in reader.deserialize() {
        let raw: RawRecord = row?;
        if !seen_ids.insert(raw.id) {
            return Err(CatalogError::DuplicateId(raw.id));
        }
        let record = Destination {
            id: raw.id,
            name: raw.name,
            category: raw.category,
            region: raw.region,
            rating: raw.rating,
            preference_score: raw.preference_score,
            latitude: raw.latitude,
            longitude: raw.longitude,
            cluster: None,
        };
        if let Err(reason) = validate(&record) {
            return Err(CatalogError::InvalidRecord {
                id: record.id,
                name: record.name,
                reason,
            });
        }
        out.push(record);
    }

    if out.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(out)
}

/// Check a record's field constraints. Returns the violation, if any.
fn validate(record: &Destination) -> Result<(), String> {
    if record.name.trim().is_empty() {
        return Err("name is empty".into());
    }
    if record.category.trim().is_empty() {
        return Err("category is empty".into());
    }
    if record.region.trim().is_empty() {
        return Err("region is empty".into());
    }
    if !record.rating.is_finite() || !(0.0..=5.0).contains(&record.rating) {
        return Err(format!("rating {} outside [0, 5]", record.rating));
    }
    if !record.preference_score.is_finite() {
        return Err("preference_score is not finite".into());
    }
    if !record.latitude.is_finite() || !(-90.0..=90.0).contains(&record.latitude) {
        return Err(format!("latitude {} outside [-90, 90]", record.latitude));
    }
    if !record.longitude.is_finite() || !(-180.0..=180.0).contains(&record.longitude) {
        return Err(format!("longitude {} outside [-180, 180]", record.longitude));
    }
    Ok(())
}

/// Immutable store of the full destination catalog.
///
/// Built once after load and cluster assignment, then only read. All
/// downstream components borrow from it; nothing mutates it.
#[derive(Debug)]
pub struct Catalog {
    records: Vec<Destination>,
}

impl Catalog {
    pub fn new(records: Vec<Destination>) -> Self {
        Self { records }
    }

    /// All records in load order.
    pub fn records(&self) -> &[Destination] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: u32) -> Option<&Destination> {
        self.records.iter().find(|d| d.id == id)
    }

    /// Distinct regions, sorted for stable display.
    pub fn regions(&self) -> Vec<&str> {
        distinct_sorted(self.records.iter().map(|d| d.region.as_str()))
    }

    /// Distinct categories, sorted for stable display.
    pub fn categories(&self) -> Vec<&str> {
        distinct_sorted(self.records.iter().map(|d| d.category.as_str()))
    }
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = values.collect::<HashSet<_>>().into_iter().collect();
    out.sort_unstable();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dest(id: u32, name: &str, category: &str, region: &str, rating: f64) -> Destination {
        Destination {
            id,
            name: name.into(),
            category: category.into(),
            region: region.into(),
            rating,
            preference_score: 3.0,
            latitude: -8.5,
            longitude: 115.2,
            cluster: None,
        }
    }

    fn write_temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const HEADER: &str = "id,name,category,region,rating,preference_score,latitude,longitude\n";

    // ── Loading ──

    #[test]
    fn load_valid_catalog() {
        let path = write_temp_csv(
            "wisatamap_test_load_valid.csv",
            &format!(
                "{HEADER}\
                 1,Pantai Kuta,Pantai,Badung,4.6,4.2,-8.7183,115.1686\n\
                 2,Pura Besakih,Pura,Karangasem,4.5,3.8,-8.3739,115.4517\n"
            ),
        );

        let records = load_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Pantai Kuta");
        assert_eq!(records[1].region, "Karangasem");
        assert!(records.iter().all(|d| d.cluster.is_none()));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_missing_field() {
        let path = write_temp_csv(
            "wisatamap_test_load_missing.csv",
            &format!("{HEADER}1,Pantai Kuta,Pantai,Badung,4.6\n"),
        );
        assert!(matches!(load_csv(&path), Err(CatalogError::Csv(_))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_non_numeric_rating() {
        let path = write_temp_csv(
            "wisatamap_test_load_nonnum.csv",
            &format!("{HEADER}1,Pantai Kuta,Pantai,Badung,great,4.2,-8.7,115.1\n"),
        );
        assert!(matches!(load_csv(&path), Err(CatalogError::Csv(_))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_out_of_range_rating() {
        let path = write_temp_csv(
            "wisatamap_test_load_range.csv",
            &format!("{HEADER}1,Pantai Kuta,Pantai,Badung,7.5,4.2,-8.7,115.1\n"),
        );
        match load_csv(&path) {
            Err(CatalogError::InvalidRecord { id: 1, .. }) => {}
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_duplicate_id() {
        let path = write_temp_csv(
            "wisatamap_test_load_dup.csv",
            &format!(
                "{HEADER}\
                 1,Pantai Kuta,Pantai,Badung,4.6,4.2,-8.7,115.1\n\
                 1,Pura Besakih,Pura,Karangasem,4.5,3.8,-8.3,115.4\n"
            ),
        );
        assert!(matches!(load_csv(&path), Err(CatalogError::DuplicateId(1))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_empty_file() {
        let path = write_temp_csv("wisatamap_test_load_empty.csv", HEADER);
        assert!(matches!(load_csv(&path), Err(CatalogError::Empty)));
        let _ = fs::remove_file(&path);
    }

    // ── Validation ──

    #[test]
    fn validate_rejects_blank_region() {
        let mut d = dest(1, "Pantai Kuta", "Pantai", "Badung", 4.6);
        d.region = "  ".into();
        assert!(validate(&d).is_err());
    }

    #[test]
    fn validate_rejects_nan_preference() {
        let mut d = dest(1, "Pantai Kuta", "Pantai", "Badung", 4.6);
        d.preference_score = f64::NAN;
        assert!(validate(&d).is_err());
    }

    #[test]
    fn validate_rejects_bad_coordinates() {
        let mut d = dest(1, "Pantai Kuta", "Pantai", "Badung", 4.6);
        d.longitude = 270.0;
        assert!(validate(&d).is_err());
    }

    // ── Catalog queries ──

    #[test]
    fn catalog_queries() {
        let catalog = Catalog::new(vec![
            dest(1, "Pantai Kuta", "Pantai", "Badung", 4.6),
            dest(2, "Pura Besakih", "Pura", "Karangasem", 4.5),
            dest(3, "Pantai Sanur", "Pantai", "Denpasar", 4.4),
        ]);

        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_empty());
        assert_eq!(catalog.get(2).unwrap().name, "Pura Besakih");
        assert!(catalog.get(99).is_none());
        assert_eq!(catalog.regions(), vec!["Badung", "Denpasar", "Karangasem"]);
        assert_eq!(catalog.categories(), vec!["Pantai", "Pura"]);
    }
}
