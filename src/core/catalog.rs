use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChartError, ChartResult};

/// Default units for magnetic field elements without explicit units.
pub const DEFAULT_UNITS: &str = "nT";

/// A measured magnetic-field component (channel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
}

impl Element {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            abbreviation: None,
            units: None,
        }
    }

    #[must_use]
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    #[must_use]
    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }

    #[must_use]
    pub fn units(&self) -> &str {
        self.units.as_deref().unwrap_or(DEFAULT_UNITS)
    }

    /// Short label used in chart headers: the abbreviation, else the id.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.abbreviation.as_deref().unwrap_or(&self.id)
    }
}

/// A station producing measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observatory {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Observatory {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            latitude: None,
            longitude: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

/// Reference descriptors for elements and observatories, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    elements: IndexMap<String, Element>,
    observatories: IndexMap<String, Observatory>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_elements(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
        self.reset_elements(elements);
        self
    }

    #[must_use]
    pub fn with_observatories(
        mut self,
        observatories: impl IntoIterator<Item = Observatory>,
    ) -> Self {
        self.reset_observatories(observatories);
        self
    }

    pub fn reset_elements(&mut self, elements: impl IntoIterator<Item = Element>) {
        self.elements = elements
            .into_iter()
            .map(|element| (element.id.clone(), element))
            .collect();
    }

    pub fn reset_observatories(&mut self, observatories: impl IntoIterator<Item = Observatory>) {
        self.observatories = observatories
            .into_iter()
            .map(|observatory| (observatory.id.clone(), observatory))
            .collect();
    }

    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    #[must_use]
    pub fn observatory(&self, id: &str) -> Option<&Observatory> {
        self.observatories.get(id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn observatories(&self) -> impl Iterator<Item = &Observatory> {
        self.observatories.values()
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: Value,
}

/// Parses observatories from a GeoJSON feature collection.
///
/// Each feature's `properties` must carry `id`; `name`, `latitude` and
/// `longitude` are optional.
pub fn parse_observatories_geojson(json: &str) -> ChartResult<Vec<Observatory>> {
    let collection: FeatureCollection = serde_json::from_str(json)?;
    collection
        .features
        .into_iter()
        .map(|feature| parse_observatory_properties(&feature.properties))
        .collect()
}

fn parse_observatory_properties(properties: &Value) -> ChartResult<Observatory> {
    let id = properties
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ChartError::Parse("observatory feature is missing `id`".to_owned()))?;

    Ok(Observatory {
        id: id.to_owned(),
        name: properties
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_owned),
        latitude: properties.get("latitude").and_then(coordinate),
        longitude: properties.get("longitude").and_then(coordinate),
    })
}

// The feed serialises coordinates as numbers or numeric strings.
fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
    .filter(|coordinate: &f64| coordinate.is_finite())
}
