use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Color, Error, MIN_SOURCES, MIN_TARGETS, Result, SourceElement, TargetElement};

/// Validated input of a link suggestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestLinksRequest {
	pub sources: Vec<SourceElement>,
	pub targets: Vec<TargetElement>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<Vec<Value>>,
}
impl SuggestLinksRequest {
	/// Checks an untyped payload and converts it. Every offending field path is reported,
	/// not only the first one.
	pub fn from_value(payload: Value) -> Result<Self> {
		let fields = rejected_fields(&payload);

		if !fields.is_empty() {
			return Err(Error::InvalidRequest {
				message: format!("{} field(s) failed validation.", fields.len()),
				fields,
			});
		}

		let request: Self = serde_json::from_value(payload)
			.map_err(|err| Error::InvalidRequest { message: err.to_string(), fields: Vec::new() })?;

		request.validate()?;

		Ok(request)
	}

	/// Checks the invariants that typed construction cannot express.
	pub fn validate(&self) -> Result<()> {
		let mut fields = Vec::new();

		if self.sources.len() < MIN_SOURCES {
			fields.push("sources".to_string());
		}
		if self.targets.len() < MIN_TARGETS {
			fields.push("targets".to_string());
		}

		for (index, source) in self.sources.iter().enumerate() {
			if let Some(color) = source.color.as_ref() {
				for (channel, value) in channels(color) {
					if !is_unit(value) {
						fields.push(format!("sources[{index}].color.{channel}"));
					}
				}
			}
		}

		if fields.is_empty() {
			return Ok(());
		}

		Err(Error::InvalidRequest {
			message: format!("{} field(s) failed validation.", fields.len()),
			fields,
		})
	}
}

fn channels(color: &Color) -> [(&'static str, f64); 3] {
	[("r", color.r), ("g", color.g), ("b", color.b)]
}

fn is_unit(value: f64) -> bool {
	value.is_finite() && (0.0..=1.0).contains(&value)
}

fn is_identifier(value: &Value) -> bool {
	value.is_string() || value.is_number()
}

fn rejected_fields(payload: &Value) -> Vec<String> {
	let mut fields = Vec::new();
	let Some(root) = payload.as_object() else {
		fields.push("$".to_string());

		return fields;
	};

	check_list(root, "sources", MIN_SOURCES, &mut fields, check_source);
	check_list(root, "targets", MIN_TARGETS, &mut fields, check_target);

	if let Some(context) = root.get("context")
		&& !context.is_null()
		&& !context.is_array()
	{
		fields.push("context".to_string());
	}

	fields
}

fn check_list(
	root: &Map<String, Value>,
	key: &str,
	min_len: usize,
	fields: &mut Vec<String>,
	check_item: fn(&Map<String, Value>, &str, &mut Vec<String>),
) {
	let Some(items) = root.get(key).and_then(Value::as_array) else {
		fields.push(key.to_string());

		return;
	};

	if items.len() < min_len {
		fields.push(key.to_string());
	}

	for (index, item) in items.iter().enumerate() {
		let path = format!("{key}[{index}]");
		let Some(object) = item.as_object() else {
			fields.push(path);

			continue;
		};

		match object.get("id") {
			Some(id) if is_identifier(id) => {},
			_ => fields.push(format!("{path}.id")),
		}

		check_item(object, &path, fields);
	}
}

fn check_source(source: &Map<String, Value>, path: &str, fields: &mut Vec<String>) {
	if let Some(parent) = source.get("parent")
		&& !parent.is_null()
		&& !is_identifier(parent)
	{
		fields.push(format!("{path}.parent"));
	}
	if let Some(label) = source.get("label")
		&& !label.is_null()
		&& !label.is_string()
	{
		fields.push(format!("{path}.label"));
	}

	let Some(color) = source.get("color").filter(|value| !value.is_null()) else {
		return;
	};
	let Some(color) = color.as_object() else {
		fields.push(format!("{path}.color"));

		return;
	};

	for channel in ["r", "g", "b"] {
		if !color.get(channel).and_then(Value::as_f64).map(is_unit).unwrap_or(false) {
			fields.push(format!("{path}.color.{channel}"));
		}
	}
}

fn check_target(target: &Map<String, Value>, path: &str, fields: &mut Vec<String>) {
	let Some(topics) = target.get("topics").filter(|value| !value.is_null()) else {
		return;
	};
	let Some(topics) = topics.as_array() else {
		fields.push(format!("{path}.topics"));

		return;
	};

	for (index, topic) in topics.iter().enumerate() {
		if !topic.is_string() {
			fields.push(format!("{path}.topics[{index}]"));
		}
	}
}
