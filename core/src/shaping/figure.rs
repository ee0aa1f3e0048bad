//! Plotly-compatible figure descriptions
//!
//! The core never draws anything. A [`Figure`] is the JSON a front-end passes
//! to `Plotly.newPlot`.

use super::map::{MapKind, MapShape};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const COLOR_SCALE: &str = "YlOrRd";
const OCCURRENCE_COLOR: &str = "rgb(178, 34, 34)";
const MAX_MARKER_SIZE: f64 = 40.0;

/// Cartographic styling shared by every map
pub fn europe_geo_layout() -> Value {
    let axis = json!({"showgrid": true, "gridwidth": 0.5, "dtick": 5});
    json!({
        "scope": "europe",
        "showland": true,
        "landcolor": "rgb(212, 212, 212)",
        "subunitcolor": "rgb(255, 255, 255)",
        "countrycolor": "rgb(255, 255, 255)",
        "showlakes": true,
        "showrivers": true,
        "lakecolor": "rgb(135, 206, 235)",
        "rivercolor": "rgb(135, 206, 235)",
        "showsubunits": true,
        "showcountries": true,
        "resolution": 50,
        "lonaxis": axis.clone(),
        "lataxis": axis,
    })
}

/// Serializable chart artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

impl Figure {
    /// Scatter map of the shaped sites
    pub fn scatter_geo(shape: &MapShape) -> Self {
        let hover_names: Vec<&str> = shape.sites.iter().map(|site| site.name.as_str()).collect();
        let column = shape.kind.column();

        let hover_text: Vec<String> = shape
            .sites
            .iter()
            .map(|site| {
                let mut lines: Vec<String> = site
                    .labels
                    .iter()
                    .map(|(label, value)| format!("{}: {}", label, display(value)))
                    .collect();
                if let MapKind::Value { .. } = shape.kind {
                    let value = site
                        .value
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "n/a".to_string());
                    lines.push(format!("{}: {}", column, value));
                }
                lines.join("<br>")
            })
            .collect();

        let marker = match &shape.kind {
            MapKind::Value { column } => {
                let values: Vec<Option<f64>> = shape.sites.iter().map(|site| site.value).collect();
                let sizes: Vec<f64> = values.iter().map(|v| v.unwrap_or(0.0).max(0.0)).collect();
                let max = sizes.iter().copied().fold(0.0_f64, f64::max);
                let sizeref = if max > 0.0 {
                    2.0 * max / (MAX_MARKER_SIZE * MAX_MARKER_SIZE)
                } else {
                    1.0
                };
                json!({
                    "color": values,
                    "colorscale": COLOR_SCALE,
                    "showscale": true,
                    "colorbar": {"title": {"text": column}},
                    "size": sizes,
                    "sizemode": "area",
                    "sizeref": sizeref,
                    "sizemin": 2,
                })
            }
            MapKind::Occurrence => json!({
                "color": OCCURRENCE_COLOR,
                "size": 8,
            }),
        };

        let trace = json!({
            "type": "scattergeo",
            "mode": "markers",
            "name": column,
            "lat": shape.sites.iter().map(|site| site.lat).collect::<Vec<_>>(),
            "lon": shape.sites.iter().map(|site| site.lon).collect::<Vec<_>>(),
            "hovertext": hover_names,
            "text": hover_text,
            "hovertemplate": "<b>%{hovertext}</b><br>%{text}<extra></extra>",
            "marker": marker,
        });

        Self {
            data: vec![trace],
            layout: json!({
                "geo": europe_geo_layout(),
                "margin": {"l": 0, "r": 0, "t": 0, "b": 0},
                "legend": {"itemsizing": "constant"},
            }),
        }
    }

    /// Number of plotted points over all traces
    pub fn point_count(&self) -> usize {
        self.data
            .iter()
            .filter_map(|trace| trace.get("lat").and_then(Value::as_array))
            .map(Vec::len)
            .sum()
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
