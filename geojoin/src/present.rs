//! Projection d'une feature vers son style et le contenu de sa popup
//!
//! C'est la seule partie du crate consommée par la couche de rendu. Elle ne
//! porte aucun état : un `Presenter` est recalculé à chaque changement de
//! table ou de métrique.

use serde::{Deserialize, Serialize};

use crate::classify::{Color, ColorScale, NEUTRAL};
use crate::join;
use crate::types::{GeoFeature, Metric, RecordIndex};

/// Valeurs de style par défaut (hors couleurs)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleDefaults {
    pub stroke_weight: f64,
    pub stroke_opacity: f64,
    pub fill_opacity: f64,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            stroke_weight: 3.0,
            stroke_opacity: 0.8,
            fill_opacity: 0.2,
        }
    }
}

/// Style d'une feature pour la couche de rendu
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRecord {
    pub stroke_color: Color,
    pub fill_color: Color,
    pub stroke_weight: f64,
    pub stroke_opacity: f64,
    pub fill_opacity: f64,
}

/// Contenu de la popup d'une feature
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PopupContent {
    /// Feature jointe à une ligne de la table
    Matched {
        name: Option<String>,
        id: String,
        revenue: f64,
        cost: f64,
    },

    /// Feature sans ligne : diagnostic de jointure
    #[serde(rename_all = "camelCase")]
    Unmatched {
        name: Option<String>,
        resolved_id: Option<String>,
        known_ids: Vec<String>,
    },
}

impl PopupContent {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Rendu HTML (échappé) pour une popup de carte
    pub fn to_html(&self) -> String {
        match self {
            Self::Matched {
                name,
                id,
                revenue,
                cost,
            } => format!(
                "<strong>{}</strong><br>ID: {}<br>Revenue: {}<br>Cost: {}",
                escape_html(name.as_deref().unwrap_or("Unnamed")),
                escape_html(id),
                format_value(*revenue),
                format_value(*cost)
            ),
            Self::Unmatched {
                name,
                resolved_id,
                known_ids,
            } => format!(
                "<strong>{}</strong><br>No data for ID: {}<br>Known IDs: {}",
                escape_html(name.as_deref().unwrap_or("Unnamed")),
                escape_html(resolved_id.as_deref().unwrap_or("none")),
                escape_html(&known_ids.join(", "))
            ),
        }
    }
}

/// Style + popup d'une feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub style: StyleRecord,
    pub popup: PopupContent,
}

/// Calcule la présentation des features pour une table et une métrique
#[derive(Debug, Clone)]
pub struct Presenter<'a> {
    index: &'a RecordIndex,
    scale: ColorScale,
    defaults: StyleDefaults,
}

impl<'a> Presenter<'a> {
    pub fn new(index: &'a RecordIndex, metric: Metric, defaults: StyleDefaults) -> Self {
        Self {
            index,
            scale: ColorScale::new(index.records(), metric),
            defaults,
        }
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    pub fn present(&self, feature: &GeoFeature) -> Presentation {
        let record = join::resolve(feature, self.index);

        let color = record.map_or(NEUTRAL, |r| self.scale.color_for_record(r));

        let style = StyleRecord {
            stroke_color: color,
            fill_color: color,
            stroke_weight: numeric_property(feature, "stroke-width")
                .unwrap_or(self.defaults.stroke_weight),
            stroke_opacity: numeric_property(feature, "stroke-opacity")
                .unwrap_or(self.defaults.stroke_opacity),
            fill_opacity: numeric_property(feature, "fill-opacity")
                .unwrap_or(self.defaults.fill_opacity),
        };

        let name = feature.name().map(str::to_string);
        let popup = match record {
            Some(record) => PopupContent::Matched {
                name,
                id: record.id.clone(),
                revenue: record.revenue,
                cost: record.cost,
            },
            None => PopupContent::Unmatched {
                name,
                resolved_id: join::resolve_identifier(feature).map(|id| id.into_owned()),
                known_ids: self.index.ids().map(str::to_string).collect(),
            },
        };

        Presentation { style, popup }
    }
}

fn numeric_property(feature: &GeoFeature, key: &str) -> Option<f64> {
    feature.properties.get(key).and_then(|value| value.as_f64())
}

fn format_value(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "n/a".to_string()
    }
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}
