//! Canvas Element Types
//!
//! A canvas is an ordered sequence of elements; z-order is append order.
//! Each drawing tool produces exactly one element variant carrying only the
//! fields that tool needs.

use serde::{Deserialize, Serialize};

/// A point in canvas coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Geometry shared by the two-point shape tools (line, rectangle, circle, arrow)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Where the pointer went down
    pub start: Point,
    /// Current (or final) pointer position
    pub end: Point,
    /// Stroke color
    pub stroke: String,
    /// Fill color, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// Stroke width
    pub size: f64,
}

/// A freehand brush stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Sampled pointer positions, in order
    pub points: Vec<Point>,
    /// Stroke color
    pub stroke: String,
}

/// A text label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    /// Top-left anchor of the text
    pub anchor: Point,
    /// Text content; empty until the text input loses focus
    #[serde(default)]
    pub text: String,
    /// Text color
    pub stroke: String,
    /// Font size in pixels
    pub font_size: f64,
}

/// One drawable primitive on a canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// Straight line
    Line(Shape),
    /// Axis-aligned rectangle spanning start..end
    Rectangle(Shape),
    /// Ellipse inscribed in the start..end box
    Circle(Shape),
    /// Line with an arrow head at `end`
    Arrow(Shape),
    /// Freehand stroke
    Brush(Stroke),
    /// Text label
    Text(TextBox),
}

impl Element {
    /// Shape geometry, for the two-point tools
    #[must_use]
    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Self::Line(s) | Self::Rectangle(s) | Self::Circle(s) | Self::Arrow(s) => Some(s),
            Self::Brush(_) | Self::Text(_) => None,
        }
    }
}

/// What kind of edit produced a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Drawing, text entry, undo or redo
    Draw,
    /// Erasing
    Erase,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draw => write!(f, "draw"),
            Self::Erase => write!(f, "erase"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Element {
        Element::Rectangle(Shape {
            start: Point::new(10.0, 20.0),
            end: Point::new(110.0, 70.0),
            stroke: "#000000".to_string(),
            fill: None,
            size: 2.0,
        })
    }

    #[test]
    fn test_element_serialization_is_tagged() {
        let json = serde_json::to_string(&rect()).unwrap();
        assert!(json.contains("\"type\":\"rectangle\""));
        assert!(!json.contains("fill"));

        let parsed: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rect());
    }

    #[test]
    fn test_text_without_content_deserializes() {
        let json = r##"{"type":"text","anchor":{"x":1.0,"y":2.0},"stroke":"#222","font_size":16.0}"##;
        let parsed: Element = serde_json::from_str(json).unwrap();
        match parsed {
            Element::Text(text) => assert!(text.text.is_empty()),
            other => unreachable!("Expected text element, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_element_type_rejected() {
        let json = r#"{"type":"hexagon","points":[]}"#;
        assert!(serde_json::from_str::<Element>(json).is_err());
    }

    #[test]
    fn test_mutation_kind_serialization() {
        assert_eq!(serde_json::to_string(&MutationKind::Erase).unwrap(), "\"erase\"");
        assert_eq!(MutationKind::Draw.to_string(), "draw");
    }
}
