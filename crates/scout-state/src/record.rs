use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Position in reference-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One detector hit for a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub class_name: String,
    pub confidence: f64,
    pub center: Point,
    pub size: (f64, f64),
}

impl DetectionRecord {
    pub fn new(class_name: impl Into<String>, confidence: f64, x: f64, y: f64) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
            center: Point::new(x, y),
            size: (0.0, 0.0),
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = (width, height);
        self
    }

    /// Build a record from the detector backend's JSON shape
    /// `{"class": .., "confidence": .., "box": [cx, cy, w, h]}`.
    ///
    /// Missing or mistyped fields default to "Unknown" / 0 instead of failing,
    /// and confidence is clamped into [0, 1].
    pub fn from_value(value: &Value) -> Self {
        let class_name = value
            .get("class")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(UNKNOWN_CLASS)
            .to_string();

        let confidence = value
            .get("confidence")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        let bbox: Vec<f64> = value
            .get("box")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|v| v.as_f64().filter(|n| n.is_finite()).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();
        let coord = |i: usize| bbox.get(i).copied().unwrap_or(0.0);

        Self {
            class_name,
            confidence,
            center: Point::new(coord(0), coord(1)),
            size: (coord(2), coord(3)),
        }
    }

    /// Parse a whole batch. Anything that is not an array yields no records.
    pub fn parse_batch(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_value).collect())
            .unwrap_or_default()
    }
}

/// Class assigned to records whose label is missing
pub const UNKNOWN_CLASS: &str = "Unknown";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_complete() {
        let rec = DetectionRecord::from_value(&json!({
            "class": "Giant",
            "confidence": 0.87,
            "box": [120.0, 240.5, 30.0, 44.0]
        }));
        assert_eq!(rec.class_name, "Giant");
        assert!((rec.confidence - 0.87).abs() < 1e-9);
        assert_eq!(rec.center, Point::new(120.0, 240.5));
        assert_eq!(rec.size, (30.0, 44.0));
    }

    #[test]
    fn test_from_value_defaults_missing_fields() {
        let rec = DetectionRecord::from_value(&json!({ "box": [15] }));
        assert_eq!(rec.class_name, UNKNOWN_CLASS);
        assert_eq!(rec.confidence, 0.0);
        assert_eq!(rec.center, Point::new(15.0, 0.0));
        assert_eq!(rec.size, (0.0, 0.0));

        let rec = DetectionRecord::from_value(&json!("garbage"));
        assert_eq!(rec.class_name, UNKNOWN_CLASS);
        assert_eq!(rec.center, Point::default());
    }

    #[test]
    fn test_from_value_clamps_confidence() {
        let high = DetectionRecord::from_value(&json!({ "class": "Zap", "confidence": 3.2 }));
        let low = DetectionRecord::from_value(&json!({ "class": "Zap", "confidence": -1 }));
        let wrong = DetectionRecord::from_value(&json!({ "class": "Zap", "confidence": "high" }));
        assert_eq!(high.confidence, 1.0);
        assert_eq!(low.confidence, 0.0);
        assert_eq!(wrong.confidence, 0.0);
    }

    #[test]
    fn test_parse_batch() {
        let batch = DetectionRecord::parse_batch(&json!([
            { "class": "Knight", "confidence": 0.5, "box": [1, 2, 3, 4] },
            {}
        ]));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].class_name, UNKNOWN_CLASS);
        assert!(DetectionRecord::parse_batch(&json!({ "class": "Knight" })).is_empty());
    }

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-9);
    }
}
