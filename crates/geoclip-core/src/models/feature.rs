//! Feature collection model.
//!
//! A `FeatureCollection` is an ordered sequence of geometry + attribute
//! records plus the schema the source exposed: the attribute column names in
//! first-seen order and the name of the geometry column. The core only needs
//! bounding-box filtering, attribute-equality filtering, and serialization
//! hooks; readers and exporters live in their own crates.

use std::collections::HashMap;

use crate::models::bbox::QueryPredicate;

/// One geometry + attribute record.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: geo::Geometry<f64>,
    pub properties: HashMap<String, serde_json::Value>,
}

impl Feature {
    pub fn new(geometry: geo::Geometry<f64>) -> Self {
        Self { geometry, properties: HashMap::new() }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// True when every (field, value) pair of the filter is present with an
    /// equal value.
    pub fn matches(&self, filter: &AttributeFilter) -> bool {
        filter
            .iter()
            .all(|(key, expected)| self.properties.get(key) == Some(expected))
    }
}

/// Attribute-equality filter: field name to required value.
pub type AttributeFilter = HashMap<String, serde_json::Value>;

/// Ordered set of features with a stable attribute schema.
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    /// Name of the geometry column as exposed by the source.
    pub geometry_column: String,
    /// Attribute column names in first-seen order.
    pub columns: Vec<String>,
}

impl FeatureCollection {
    pub fn new(geometry_column: impl Into<String>) -> Self {
        Self {
            features: Vec::new(),
            geometry_column: geometry_column.into(),
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Append a feature, extending the schema with any unseen columns.
    /// New columns are appended in sorted order so the schema is stable
    /// regardless of property-map iteration order.
    pub fn push(&mut self, feature: Feature) {
        let mut new_keys: Vec<&String> = feature
            .properties
            .keys()
            .filter(|key| !self.columns.iter().any(|c| &c == key))
            .collect();
        new_keys.sort();
        for key in new_keys {
            self.columns.push(key.clone());
        }
        self.features.push(feature);
    }

    /// Source schema: attribute columns plus the geometry column.
    pub fn schema(&self) -> Vec<String> {
        let mut schema = self.columns.clone();
        schema.push(self.geometry_column.clone());
        schema
    }

    /// Keep only features whose geometry intersects the query rectangle.
    pub fn filter_bbox(&self, predicate: &QueryPredicate) -> FeatureCollection {
        let mut filtered = FeatureCollection {
            features: Vec::new(),
            geometry_column: self.geometry_column.clone(),
            columns: self.columns.clone(),
        };
        filtered.features = self
            .features
            .iter()
            .filter(|f| predicate.matches(&f.geometry))
            .cloned()
            .collect();
        filtered
    }

    /// Keep only features matching every pair of the attribute filter.
    pub fn filter_attributes(&self, filter: &AttributeFilter) -> FeatureCollection {
        FeatureCollection {
            features: self.features.iter().filter(|f| f.matches(filter)).cloned().collect(),
            geometry_column: self.geometry_column.clone(),
            columns: self.columns.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;
    use geo::Point;
    use serde_json::json;

    fn sample_collection() -> FeatureCollection {
        let mut collection = FeatureCollection::new("geometry");
        collection.push(
            Feature::new(geo::Geometry::Point(Point::new(1.0, 1.0)))
                .with_property("state", json!("FL"))
                .with_property("pop", json!(120)),
        );
        collection.push(
            Feature::new(geo::Geometry::Point(Point::new(50.0, 50.0)))
                .with_property("state", json!("GA")),
        );
        collection
    }

    #[test]
    fn test_schema_accumulates_columns() {
        let collection = sample_collection();
        assert_eq!(collection.columns, vec!["pop", "state"]);
        assert_eq!(collection.schema(), vec!["pop", "state", "geometry"]);
    }

    #[test]
    fn test_filter_bbox() {
        let collection = sample_collection();
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let filtered = collection.filter_bbox(&bbox.to_query_predicate());

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.features[0].properties["state"], json!("FL"));
        // Schema survives filtering even when matching features lack a column
        assert_eq!(filtered.columns, vec!["pop", "state"]);
    }

    #[test]
    fn test_filter_attributes() {
        let collection = sample_collection();
        let mut filter = AttributeFilter::new();
        filter.insert("state".to_string(), json!("GA"));

        let filtered = collection.filter_attributes(&filter);
        assert_eq!(filtered.len(), 1);

        filter.insert("missing".to_string(), json!(true));
        assert!(collection.filter_attributes(&filter).is_empty());
    }
}
