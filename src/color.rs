use crate::data::Row;
use serde::Serialize;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorEntry {
    pub value: String,
    pub color: String,
}

/// Distinct color-column values, in first-appearance order, with their colors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorMap {
    entries: Vec<ColorEntry>,
    lookup: HashMap<String, usize>,
}

impl ColorMap {
    pub fn color_for(&self, value: &str) -> Option<&str> {
        self.lookup
            .get(value)
            .map(|&index| self.entries[index].color.as_str())
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rows without the column share the empty-string entry.
pub fn assign_colors(rows: &[Row], color_column: &str) -> ColorMap {
    let mut distinct: Vec<&str> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let value = row.get_or_empty(color_column);
        if !lookup.contains_key(value) {
            lookup.insert(value.to_string(), distinct.len());
            distinct.push(value);
        }
    }

    let count = distinct.len() as f64;
    let entries = distinct
        .iter()
        .enumerate()
        .map(|(index, value)| ColorEntry {
            value: value.to_string(),
            color: interpolate_rainbow(index as f64 / count).to_string(),
        })
        .collect();
    ColorMap { entries, lookup }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Cyclic rainbow built on the cubehelix color space; `t` wraps at 1.
pub fn interpolate_rainbow(t: f64) -> Rgb {
    let t = t - t.floor();
    let ts = (t - 0.5).abs();
    cubehelix_to_rgb(360.0 * t - 100.0, 1.5 - 1.5 * ts, 0.8 - 0.9 * ts)
}

const CH_A: f64 = -0.14861;
const CH_B: f64 = 1.78277;
const CH_C: f64 = -0.29227;
const CH_D: f64 = -0.90649;
const CH_E: f64 = 1.97294;

fn cubehelix_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let h = (hue + 120.0) * PI / 180.0;
    let a = saturation * lightness * (1.0 - lightness);
    let (sin_h, cos_h) = h.sin_cos();
    Rgb {
        r: channel(lightness + a * (CH_A * cos_h + CH_B * sin_h)),
        g: channel(lightness + a * (CH_C * cos_h + CH_D * sin_h)),
        b: channel(lightness + a * (CH_E * cos_h)),
    }
}

fn channel(value: f64) -> u8 {
    let scaled = (value * 255.0).round();
    if scaled.is_nan() {
        0
    } else {
        scaled.clamp(0.0, 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[&str]) -> Vec<Row> {
        values
            .iter()
            .map(|value| [("team", *value)].into_iter().collect())
            .collect()
    }

    #[test]
    fn rainbow_endpoints() {
        assert_eq!(interpolate_rainbow(0.0).to_string(), "rgb(110, 64, 170)");
        assert_eq!(interpolate_rainbow(1.0), interpolate_rainbow(0.0));
        assert_eq!(interpolate_rainbow(0.5).to_string(), "rgb(175, 240, 91)");
    }

    #[test]
    fn assigns_in_first_appearance_order() {
        let map = assign_colors(&rows(&["red", "blue", "red", "green"]), "team");
        let values: Vec<&str> = map.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["red", "blue", "green"]);
        assert_eq!(map.color_for("red"), Some(interpolate_rainbow(0.0).to_string().as_str()));
        assert_eq!(
            map.color_for("green"),
            Some(interpolate_rainbow(2.0 / 3.0).to_string().as_str())
        );
    }

    #[test]
    fn equal_values_share_a_color_and_reruns_match() {
        let input = rows(&["a", "b", "a", "c", "b"]);
        let first = assign_colors(&input, "team");
        let second = assign_colors(&input, "team");
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_ne!(first.color_for("a"), first.color_for("b"));
    }

    #[test]
    fn missing_column_maps_to_empty_value() {
        let map = assign_colors(&rows(&["a"]), "other");
        assert_eq!(map.len(), 1);
        assert!(map.color_for("").is_some());
    }

    #[test]
    fn empty_rows_give_empty_map() {
        assert!(assign_colors(&[], "team").is_empty());
    }
}
