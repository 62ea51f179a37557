#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory administrative boundary set.
//!
//! Parses regency/city and district polygons from a `GeoJSON`
//! `FeatureCollection`, builds an R-tree over their envelopes, and answers
//! strict point-in-polygon questions for a selected subset of polygons.
//! Loaded once per process and shared read-only.

use std::collections::BTreeSet;

use geo::{BoundingRect, Contains, MultiPolygon, Point};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use landslide_viewer_incident_models::canonical_name;
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading boundaries.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// The input was not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The `GeoJSON` document was valid but not a `FeatureCollection`.
    #[error("Expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,
}

/// Names of the boundary feature properties holding the administrative
/// names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryFields {
    /// Regency/city name property.
    pub region: String,
    /// District (kecamatan) name property.
    pub district: String,
}

impl Default for BoundaryFields {
    fn default() -> Self {
        Self {
            region: "KABKOT".to_string(),
            district: "KECAMATAN".to_string(),
        }
    }
}

/// One administrative unit outline.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    /// Canonical region name.
    pub region: Option<String>,
    /// Canonical district name.
    pub district: Option<String>,
    /// Outline in EPSG:4326.
    pub geometry: MultiPolygon<f64>,
    /// All feature properties as loaded.
    pub properties: JsonObject,
}

impl BoundaryPolygon {
    /// Builds a polygon with no extra properties.
    #[must_use]
    pub fn new(region: &str, district: Option<&str>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            region: canonical_name(region),
            district: district.and_then(canonical_name),
            geometry,
            properties: JsonObject::new(),
        }
    }

    /// Strict containment: points on the outline are not inside.
    #[must_use]
    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.geometry.contains(point)
    }

    /// Converts back into a `GeoJSON` feature for display.
    #[must_use]
    pub fn to_feature(&self) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(
                &self.geometry,
            ))),
            id: None,
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }
}

/// Envelope of a polygon stored in the R-tree, pointing back at its index.
struct BoundaryEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// All boundary polygons plus an R-tree over their envelopes.
pub struct BoundarySet {
    polygons: Vec<BoundaryPolygon>,
    tree: RTree<BoundaryEntry>,
}

impl std::fmt::Debug for BoundarySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundarySet")
            .field("polygons", &self.polygons.len())
            .finish_non_exhaustive()
    }
}

impl BoundarySet {
    /// Builds the set and its spatial index.
    #[must_use]
    pub fn new(polygons: Vec<BoundaryPolygon>) -> Self {
        let entries = polygons
            .iter()
            .enumerate()
            .map(|(index, polygon)| BoundaryEntry {
                index,
                envelope: compute_envelope(&polygon.geometry),
            })
            .collect();

        Self {
            polygons,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Parses a `GeoJSON` `FeatureCollection` string.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the text is not `GeoJSON` or not a
    /// `FeatureCollection`.
    pub fn from_geojson_str(
        geojson_str: &str,
        fields: &BoundaryFields,
    ) -> Result<Self, SpatialError> {
        let geojson: GeoJson = geojson_str.parse()?;
        match geojson {
            GeoJson::FeatureCollection(collection) => {
                Ok(Self::from_feature_collection(collection, fields))
            }
            _ => Err(SpatialError::NotFeatureCollection),
        }
    }

    /// Builds the set from parsed features. Features without polygonal
    /// geometry are skipped.
    #[must_use]
    pub fn from_feature_collection(collection: FeatureCollection, fields: &BoundaryFields) -> Self {
        let total = collection.features.len();
        let polygons: Vec<BoundaryPolygon> = collection
            .features
            .into_iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                let polygon = parse_feature(feature, fields);
                if polygon.is_none() {
                    log::warn!("Skipping boundary feature {i}: no polygon geometry");
                }
                polygon
            })
            .collect();

        log::info!("Loaded {} of {total} boundary polygons", polygons.len());

        Self::new(polygons)
    }

    /// All polygons in load order.
    #[must_use]
    pub fn polygons(&self) -> &[BoundaryPolygon] {
        &self.polygons
    }

    /// Number of polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Whether the set has no polygons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Sorted distinct canonical region names.
    #[must_use]
    pub fn region_names(&self) -> Vec<String> {
        self.polygons
            .iter()
            .filter_map(|p| p.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every polygon.
    #[must_use]
    pub fn all(&self) -> BoundarySelection<'_> {
        BoundarySelection {
            set: self,
            members: (0..self.polygons.len()).collect(),
        }
    }

    /// No polygon.
    #[must_use]
    pub const fn none(&self) -> BoundarySelection<'_> {
        BoundarySelection {
            set: self,
            members: Vec::new(),
        }
    }

    /// Polygons whose canonical region name equals `region`.
    #[must_use]
    pub fn select_region(&self, region: &str) -> BoundarySelection<'_> {
        self.select_where(|p| p.region.as_deref() == Some(region))
    }

    /// Polygons matching both the region and the district name.
    #[must_use]
    pub fn select_district(&self, region: &str, district: &str) -> BoundarySelection<'_> {
        self.select_where(|p| {
            p.region.as_deref() == Some(region) && p.district.as_deref() == Some(district)
        })
    }

    fn select_where(&self, predicate: impl Fn(&BoundaryPolygon) -> bool) -> BoundarySelection<'_> {
        BoundarySelection {
            set: self,
            members: self
                .polygons
                .iter()
                .enumerate()
                .filter(|(_, p)| predicate(p))
                .map(|(i, _)| i)
                .collect(),
        }
    }
}

/// A subset of a [`BoundarySet`], identified by polygon index.
#[derive(Clone)]
pub struct BoundarySelection<'a> {
    set: &'a BoundarySet,
    /// Sorted polygon indexes.
    members: Vec<usize>,
}

impl std::fmt::Debug for BoundarySelection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.members).finish()
    }
}

impl<'a> BoundarySelection<'a> {
    /// Selected polygons in load order.
    pub fn polygons(&self) -> impl Iterator<Item = &'a BoundaryPolygon> + '_ {
        self.members.iter().map(|&i| &self.set.polygons[i])
    }

    /// Number of selected polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `point` lies strictly inside at least one selected polygon.
    ///
    /// Each polygon is tested on its own, so a point on an edge shared by
    /// two selected polygons is inside neither.
    #[must_use]
    pub fn contains(&self, point: &Point<f64>) -> bool {
        if self.members.is_empty() {
            return false;
        }

        let query_env = AABB::from_point([point.x(), point.y()]);

        self.set
            .tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| self.members.binary_search(&entry.index).is_ok())
            .any(|entry| self.set.polygons[entry.index].contains(point))
    }

    /// Selected polygons as a `GeoJSON` `FeatureCollection`.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.polygons().map(BoundaryPolygon::to_feature).collect(),
            foreign_members: None,
        }
    }
}

/// Converts a feature into a boundary polygon. Handles both `Polygon` and
/// `MultiPolygon` geometry types.
fn parse_feature(feature: Feature, fields: &BoundaryFields) -> Option<BoundaryPolygon> {
    let geometry: geo::Geometry<f64> = feature.geometry?.try_into().ok()?;
    let geometry = match geometry {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
        _ => return None,
    };

    let properties = feature.properties.unwrap_or_default();
    let region = property_name(&properties, &fields.region);
    let district = property_name(&properties, &fields.district);

    Some(BoundaryPolygon {
        region,
        district,
        geometry,
        properties,
    })
}

/// Reads a name property as canonical text. Numbers are rendered as text.
fn property_name(properties: &JsonObject, key: &str) -> Option<String> {
    match properties.get(key)? {
        serde_json::Value::String(s) => canonical_name(s),
        serde_json::Value::Number(n) => canonical_name(&n.to_string()),
        _ => None,
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
