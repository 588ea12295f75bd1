use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Opaque element identifier. Callers may use numbers or strings; the original form is
/// kept so it can be echoed back unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
	Int(i64),
	/// Any other JSON number, such as `1.0` or values beyond `i64`.
	Number(Number),
	Text(String),
}
impl fmt::Display for ElementId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(value) => write!(f, "{value}"),
			Self::Number(value) => write!(f, "{value}"),
			Self::Text(value) => f.write_str(value),
		}
	}
}
impl From<i64> for ElementId {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<&str> for ElementId {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

/// RGB color with every channel in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
	pub r: f64,
	pub g: f64,
	pub b: f64,
}

/// A UI/content unit that may originate a link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceElement {
	pub id: ElementId,
	/// Hierarchy parent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent: Option<ElementId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<Color>,
	/// Attributes this service does not interpret; forwarded to the qualification provider.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl SourceElement {
	pub fn new(id: impl Into<ElementId>) -> Self {
		Self { id: id.into(), parent: None, label: None, color: None, extra: Map::new() }
	}
}

/// A candidate destination page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetElement {
	pub id: ElementId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub topics: Option<Vec<String>>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl TargetElement {
	pub fn new(id: impl Into<ElementId>) -> Self {
		Self { id: id.into(), topics: None, extra: Map::new() }
	}
}
