//! Classification : échelle de couleurs linéaire sur une métrique

use std::fmt;

use serde::{Serialize, Serializer};

use crate::types::{Metric, MetricRecord};

/// Couleur RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` en minuscules
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ancre claire (t = 0)
pub const LIGHT_ANCHOR: Color = Color::new(237, 233, 254);

/// Ancre foncée (t = 1)
pub const DARK_ANCHOR: Color = Color::new(88, 28, 135);

/// Couleur des valeurs non classables (pas de plage, NaN, plage dégénérée)
pub const NEUTRAL: Color = Color::new(156, 163, 175);

/// Plage observée d'une métrique
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

/// Calcule min/max des valeurs finies de la métrique; `None` s'il n'y en a aucune
pub fn compute_range<'a>(
    records: impl IntoIterator<Item = &'a MetricRecord>,
    metric: Metric,
) -> Option<MetricRange> {
    records
        .into_iter()
        .map(|record| record.value(metric))
        .filter(|value| value.is_finite())
        .fold(None, |range, value| match range {
            None => Some(MetricRange {
                min: value,
                max: value,
            }),
            Some(MetricRange { min, max }) => Some(MetricRange {
                min: min.min(value),
                max: max.max(value),
            }),
        })
}

/// Couleur d'une valeur sur la plage (interpolation linéaire par canal)
pub fn color_for(value: f64, range: Option<MetricRange>) -> Color {
    let Some(MetricRange { min, max }) = range else {
        return NEUTRAL;
    };
    if !value.is_finite() || min == max {
        return NEUTRAL;
    }

    let t = normalized(value, min, max).clamp(0.0, 1.0);

    Color::new(
        lerp_channel(LIGHT_ANCHOR.r, DARK_ANCHOR.r, t),
        lerp_channel(LIGHT_ANCHOR.g, DARK_ANCHOR.g, t),
        lerp_channel(LIGHT_ANCHOR.b, DARK_ANCHOR.b, t),
    )
}

/// Position de `value` sur [min, max]; travaille sur les moitiés quand
/// l'écart dépasse `f64::MAX`
fn normalized(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).is_finite() {
        (value - min) / (max - min)
    } else {
        (value / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0)
    }
}

/// Valeur à la fraction `frac` de [min, max], sans débordement
fn interpolate(min: f64, max: f64, frac: f64) -> f64 {
    if (max - min).is_finite() {
        min + (max - min) * frac
    } else {
        min + (max / 2.0 - min / 2.0) * (2.0 * frac)
    }
}

#[inline]
fn lerp_channel(light: u8, dark: u8, t: f64) -> u8 {
    let light = f64::from(light);
    let dark = f64::from(dark);
    // Toujours dans [0, 255] puisque t est borné
    (light + (dark - light) * t).round() as u8
}

/// Repère de légende
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendStop {
    pub value: f64,
    pub color: Color,
}

/// Échelle de couleurs d'une métrique sur un jeu d'enregistrements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    metric: Metric,
    range: Option<MetricRange>,
}

impl ColorScale {
    pub fn new<'a>(records: impl IntoIterator<Item = &'a MetricRecord>, metric: Metric) -> Self {
        Self {
            metric,
            range: compute_range(records, metric),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn range(&self) -> Option<MetricRange> {
        self.range
    }

    pub fn color_for(&self, value: f64) -> Color {
        color_for(value, self.range)
    }

    /// Couleur d'un enregistrement pour la métrique de l'échelle
    pub fn color_for_record(&self, record: &MetricRecord) -> Color {
        self.color_for(record.value(self.metric))
    }

    /// `steps` repères régulièrement espacés de min à max
    pub fn legend(&self, steps: usize) -> Vec<LegendStop> {
        let Some(MetricRange { min, max }) = self.range else {
            return Vec::new();
        };

        if min == max || steps < 2 {
            return vec![LegendStop {
                value: min,
                color: self.color_for(min),
            }];
        }

        (0..steps)
            .map(|i| {
                let value = if i == steps - 1 {
                    max
                } else {
                    interpolate(min, max, i as f64 / (steps - 1) as f64)
                };
                LegendStop {
                    value,
                    color: self.color_for(value),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, revenue: f64, cost: f64) -> MetricRecord {
        MetricRecord {
            id: id.to_string(),
            revenue,
            cost,
        }
    }

    const RANGE: Option<MetricRange> = Some(MetricRange {
        min: 100.0,
        max: 200.0,
    });

    #[test]
    fn test_anchors_at_bounds() {
        assert_eq!(color_for(100.0, RANGE), LIGHT_ANCHOR);
        assert_eq!(color_for(200.0, RANGE), DARK_ANCHOR);
    }

    #[test]
    fn test_midpoint() {
        // 237 + (88 - 237) * 0.5 = 162.5 -> 163
        // 233 + (28 - 233) * 0.5 = 130.5 -> 131
        // 254 + (135 - 254) * 0.5 = 194.5 -> 195
        assert_eq!(color_for(150.0, RANGE), Color::new(163, 131, 195));
    }

    #[test]
    fn test_neutral_cases() {
        assert_eq!(color_for(150.0, None), NEUTRAL);
        assert_eq!(color_for(f64::NAN, RANGE), NEUTRAL);
        assert_eq!(color_for(f64::INFINITY, RANGE), NEUTRAL);
        let flat = Some(MetricRange { min: 5.0, max: 5.0 });
        assert_eq!(color_for(5.0, flat), NEUTRAL);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(color_for(50.0, RANGE), LIGHT_ANCHOR);
        assert_eq!(color_for(500.0, RANGE), DARK_ANCHOR);
    }

    #[test]
    fn test_span_wider_than_f64_max() {
        let records = vec![record("lo", -1e308, 0.0), record("hi", 1e308, 0.0)];
        let range = compute_range(&records, Metric::Revenue);
        assert_eq!(
            range,
            Some(MetricRange {
                min: -1e308,
                max: 1e308
            })
        );

        assert_eq!(color_for(-1e308, range), LIGHT_ANCHOR);
        assert_eq!(color_for(1e308, range), DARK_ANCHOR);
        assert_eq!(color_for(0.0, range), Color::new(163, 131, 195));
        assert_eq!(color_for(f64::MAX, range), DARK_ANCHOR);

        let legend = ColorScale::new(&records, Metric::Revenue).legend(3);
        assert!(legend.iter().all(|stop| stop.value.is_finite()));
        assert_eq!(legend[1].value, 0.0);
        assert_eq!(legend[2].color, DARK_ANCHOR);
    }

    #[test]
    fn test_compute_range_skips_non_finite() {
        let records = vec![
            record("a", 100.0, f64::NAN),
            record("b", f64::NAN, 3.0),
            record("c", 200.0, f64::NEG_INFINITY),
        ];
        assert_eq!(
            compute_range(&records, Metric::Revenue),
            Some(MetricRange {
                min: 100.0,
                max: 200.0
            })
        );
        assert_eq!(
            compute_range(&records, Metric::Cost),
            Some(MetricRange { min: 3.0, max: 3.0 })
        );
        assert_eq!(compute_range(&records[..0], Metric::Cost), None);
        assert_eq!(compute_range(&records[..1], Metric::Cost), None);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(LIGHT_ANCHOR.to_hex(), "#ede9fe");
        assert_eq!(DARK_ANCHOR.to_hex(), "#581c87");
        assert_eq!(NEUTRAL.to_hex(), "#9ca3af");
    }

    #[test]
    fn test_legend() {
        let records = vec![record("a", 0.0, 0.0), record("b", 10.0, 0.0)];
        let scale = ColorScale::new(&records, Metric::Revenue);

        let legend = scale.legend(3);
        assert_eq!(legend.len(), 3);
        assert_eq!(legend[0].color, LIGHT_ANCHOR);
        assert_eq!(legend[1].value, 5.0);
        assert_eq!(legend[2].color, DARK_ANCHOR);

        let flat = ColorScale::new(&records, Metric::Cost);
        assert_eq!(flat.legend(5).len(), 1);
        assert_eq!(flat.legend(5)[0].color, NEUTRAL);

        let empty = ColorScale::new(&Vec::<MetricRecord>::new(), Metric::Cost);
        assert!(empty.legend(5).is_empty());
    }
}
