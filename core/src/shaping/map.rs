//! Aggregation of query results into map sites

use super::describe::median;
use crate::error::{QueryError, Result};
use crate::graph::{columns, Record};
use serde_json::Value;
use std::collections::HashMap;

pub const SITE_NAME_COLUMN: &str = "SiteName";
pub const LATITUDE_COLUMN: &str = "Lat";
pub const LONGITUDE_COLUMN: &str = "Lon";
pub const REQUIRED_COLUMNS: [&str; 3] = [SITE_NAME_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN];

/// Value columns in priority order; the first present one colors the map
pub const VALUE_COLUMNS: [&str; 6] = [
    "Concentration",
    "DriverImportance",
    "TU",
    "ratioTU",
    "sumTU",
    "maxTU",
];

/// Columns carried into the hover information when present
pub const LABEL_COLUMNS: [&str; 6] = [
    "ChemicalName",
    "WaterBody",
    "RiverBasin",
    "Country",
    "Year",
    "Quarter",
];

pub const OCCURRENCE_COLUMN: &str = "Occurrence";

/// What the map encodes
#[derive(Debug, Clone, PartialEq)]
pub enum MapKind {
    /// Median of a value column per site
    Value { column: String },
    /// Presence of sites only
    Occurrence,
}

impl MapKind {
    pub fn column(&self) -> &str {
        match self {
            MapKind::Value { column } => column,
            MapKind::Occurrence => OCCURRENCE_COLUMN,
        }
    }
}

/// One point on the map
#[derive(Debug, Clone, PartialEq)]
pub struct MapSite {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Aggregated value, `None` when every value of the site was null
    pub value: Option<f64>,
    /// First non-null label per label column, in [`LABEL_COLUMNS`] order
    pub labels: Vec<(String, Value)>,
}

/// Sites ready to be drawn
#[derive(Debug, Clone)]
pub struct MapShape {
    pub kind: MapKind,
    pub sites: Vec<MapSite>,
    /// Label columns present in the result
    pub label_columns: Vec<String>,
}

struct SiteGroup {
    name: String,
    lat: f64,
    lon: f64,
    values: Vec<f64>,
    labels: HashMap<String, Value>,
}

impl MapShape {
    /// Group records by site and aggregate them.
    ///
    /// Fails with [`QueryError::ArtifactRender`] if the site columns are
    /// missing or no row has numeric coordinates.
    pub fn from_records(records: &[Record], query: &str) -> Result<Self> {
        let present = columns(records);
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|required| !present.iter().any(|c| c == required))
            .collect();
        if !missing.is_empty() {
            return Err(render_error(
                query,
                format!(
                    "Returned database result is missing the required columns: {}",
                    missing.join(", ")
                ),
            ));
        }

        let kind = VALUE_COLUMNS
            .iter()
            .find(|column| present.iter().any(|c| c == *column))
            .map(|column| MapKind::Value {
                column: column.to_string(),
            })
            .unwrap_or(MapKind::Occurrence);

        let label_columns: Vec<String> = LABEL_COLUMNS
            .iter()
            .filter(|column| present.iter().any(|c| c == *column))
            .map(|column| column.to_string())
            .collect();

        let mut groups: Vec<SiteGroup> = Vec::new();
        let mut index: HashMap<(String, u64, u64), usize> = HashMap::new();
        let mut skipped = 0usize;

        for record in records {
            let (Some(lat), Some(lon)) = (
                record.get(LATITUDE_COLUMN).and_then(Value::as_f64),
                record.get(LONGITUDE_COLUMN).and_then(Value::as_f64),
            ) else {
                skipped += 1;
                continue;
            };
            let name = match record.get(SITE_NAME_COLUMN) {
                Some(Value::String(name)) => name.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };

            let key = (name.clone(), lat.to_bits(), lon.to_bits());
            let position = *index.entry(key).or_insert_with(|| {
                groups.push(SiteGroup {
                    name,
                    lat,
                    lon,
                    values: Vec::new(),
                    labels: HashMap::new(),
                });
                groups.len() - 1
            });
            let group = &mut groups[position];

            if let MapKind::Value { column } = &kind {
                if let Some(value) = record.get(column).and_then(Value::as_f64) {
                    group.values.push(value);
                }
            }
            for column in &label_columns {
                match record.get(column) {
                    Some(value) if !value.is_null() && !group.labels.contains_key(column) => {
                        group.labels.insert(column.clone(), value.clone());
                    }
                    _ => {}
                }
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, "Skipped rows without numeric coordinates");
        }
        if groups.is_empty() {
            return Err(render_error(
                query,
                "No row has numeric Lat and Lon values".to_string(),
            ));
        }

        let sites = groups
            .into_iter()
            .map(|mut group| MapSite {
                value: match kind {
                    MapKind::Value { .. } => median(&group.values),
                    MapKind::Occurrence => Some(1.0),
                },
                labels: label_columns
                    .iter()
                    .filter_map(|column| {
                        group
                            .labels
                            .remove(column)
                            .map(|value| (column.clone(), value))
                    })
                    .collect(),
                name: group.name,
                lat: group.lat,
                lon: group.lon,
            })
            .collect();

        Ok(Self {
            kind,
            sites,
            label_columns,
        })
    }
}

fn render_error(query: &str, message: String) -> crate::error::Error {
    QueryError::ArtifactRender {
        query: query.to_string(),
        message,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn records(rows: Value) -> Vec<Record> {
        rows.as_array()
            .unwrap()
            .iter()
            .map(|row| row.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_value_column_priority() {
        let rows = records(json!([
            {"SiteName": "A", "Lat": 50.0, "Lon": 8.0, "sumTU": 0.1, "TU": 0.4}
        ]));
        let shape = MapShape::from_records(&rows, "q").unwrap();
        assert_eq!(
            shape.kind,
            MapKind::Value {
                column: "TU".to_string()
            }
        );
    }

    #[test]
    fn test_median_per_site_with_first_labels() {
        let rows = records(json!([
            {"ChemicalName": "Diuron", "Concentration": 1.0, "Year": null, "SiteName": "A", "Lat": 50.0, "Lon": 8.0},
            {"ChemicalName": "Diuron", "Concentration": 5.0, "Year": 2016, "SiteName": "A", "Lat": 50.0, "Lon": 8.0},
            {"ChemicalName": "Diuron", "Concentration": 2.0, "Year": 2017, "SiteName": "A", "Lat": 50.0, "Lon": 8.0},
            {"ChemicalName": "Diuron", "Concentration": null, "Year": 2015, "SiteName": "B", "Lat": 48.0, "Lon": 11.0}
        ]));
        let shape = MapShape::from_records(&rows, "q").unwrap();

        assert_eq!(shape.sites.len(), 2);
        assert_eq!(shape.sites[0].value, Some(2.0));
        assert_eq!(
            shape.sites[0].labels,
            vec![
                ("ChemicalName".to_string(), json!("Diuron")),
                ("Year".to_string(), json!(2016))
            ]
        );
        assert_eq!(shape.sites[1].value, None);
    }

    #[test]
    fn test_occurrence_fallback_deduplicates() {
        let rows = records(json!([
            {"SiteName": "A", "Lat": 50.0, "Lon": 8.0, "Country": "Germany"},
            {"SiteName": "A", "Lat": 50.0, "Lon": 8.0, "Country": "Germany"},
            {"SiteName": "B", "Lat": 48.0, "Lon": 11.0, "Country": "Germany"}
        ]));
        let shape = MapShape::from_records(&rows, "q").unwrap();

        assert_eq!(shape.kind, MapKind::Occurrence);
        assert_eq!(shape.kind.column(), "Occurrence");
        assert_eq!(shape.sites.len(), 2);
        assert!(shape.sites.iter().all(|site| site.value == Some(1.0)));
    }

    #[test]
    fn test_missing_required_columns() {
        let rows = records(json!([{"SiteName": "A", "Concentration": 1.0}]));
        let err = MapShape::from_records(&rows, "MATCH (l:Site) RETURN l.name AS SiteName").unwrap_err();

        assert!(matches!(err, Error::Query(QueryError::ArtifactRender { .. })));
        let message = err.to_string();
        assert!(message.contains("Lat, Lon"));
        assert!(message.contains("MATCH (l:Site) RETURN l.name AS SiteName"));
    }

    #[test]
    fn test_rows_without_coordinates_are_skipped() {
        let rows = records(json!([
            {"SiteName": "A", "Lat": null, "Lon": 8.0, "TU": 1.0},
            {"SiteName": "B", "Lat": 48.0, "Lon": 11.0, "TU": 2.0}
        ]));
        let shape = MapShape::from_records(&rows, "q").unwrap();
        assert_eq!(shape.sites.len(), 1);
        assert_eq!(shape.sites[0].name, "B");

        let rows = records(json!([{"SiteName": "A", "Lat": "north", "Lon": 8.0}]));
        assert!(MapShape::from_records(&rows, "q").is_err());
    }
}
