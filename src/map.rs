use serde::Serialize;
use thiserror::Error;

use crate::filter::FilteredView;

/// Default map viewport over Bali for the boundary renderer.
pub const MAP_CENTER: (f64, f64) = (-8.4, 115.2);
pub const MAP_ZOOM: u32 = 10;

/// Default per-cluster marker colors.
pub const DEFAULT_COLORS: [&str; 7] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8",
];

/// Errors raised during projection. Both indicate a configuration mismatch
/// between the model and the map setup, surfaced to the operator rather
/// than clamped or wrapped around.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("cluster {cluster} has no palette color (palette holds {palette_len})")]
    PaletteExhausted { cluster: usize, palette_len: usize },
    #[error("destination {id} has no cluster assignment")]
    Unassigned { id: u32 },
}

/// Fixed, ordered color palette indexed by cluster id.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    pub fn new(colors: Vec<String>) -> Self {
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Bounded lookup: a cluster id beyond the palette is an error, never a
    /// silent wraparound.
    pub fn color(&self, cluster: usize) -> Result<&str, MapError> {
        self.colors
            .get(cluster)
            .map(String::as_str)
            .ok_or(MapError::PaletteExhausted {
                cluster,
                palette_len: self.colors.len(),
            })
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(DEFAULT_COLORS.iter().map(|c| c.to_string()).collect())
    }
}

/// Popup metadata carried by each marker for the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct MarkerInfo {
    pub name: String,
    pub region: String,
    pub category: String,
    pub rating: f64,
    pub preference_score: f64,
}

/// A map-ready point: coordinates, the cluster's palette color, and popup
/// metadata.
#[derive(Debug, Clone, Serialize)]
pub struct GeoMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub cluster: usize,
    pub color: String,
    pub info: MarkerInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub cluster: usize,
    pub color: String,
}

/// Markers and legend for one filtered view, ready for an external map
/// renderer.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub markers: Vec<GeoMarker>,
    /// One entry per cluster actually present in the view, ascending.
    /// Not all k clusters globally.
    pub legend: Vec<LegendEntry>,
}

/// Project a filtered view onto the map: one marker per record, colored by
/// its assigned cluster, plus a legend limited to the clusters present.
///
/// Pure; consumes assignments as-is and never re-derives them. A record
/// without an assignment is an error.
pub fn project(view: &FilteredView, palette: &Palette) -> Result<MapView, MapError> {
    let mut markers = Vec::with_capacity(view.count());
    for d in view.records() {
        let cluster = d.cluster.ok_or(MapError::Unassigned { id: d.id })?;
        let color = palette.color(cluster)?.to_string();
        markers.push(GeoMarker {
            latitude: d.latitude,
            longitude: d.longitude,
            cluster,
            color,
            info: MarkerInfo {
                name: d.name.clone(),
                region: d.region.clone(),
                category: d.category.clone(),
                rating: d.rating,
                preference_score: d.preference_score,
            },
        });
    }

    let mut legend = Vec::new();
    for cluster in view.cluster_ids() {
        legend.push(LegendEntry {
            cluster,
            color: palette.color(cluster)?.to_string(),
        });
    }

    Ok(MapView { markers, legend })
}
