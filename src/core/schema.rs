//! Descriptive JSON Schema for tool parameters.
//!
//! The output is advertised through `tools/list` only. Nothing here is used to
//! reject arguments; handlers validate their own input.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as J};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
            ParamType::Null => "null",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, ParamType::Number | ParamType::Integer)
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema {
    pub name: String,
    pub kind: ParamType,
    pub description: Option<String>,
    pub required: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub pattern: Option<String>,
    pub enum_values: Vec<String>,
}

impl ParamSchema {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            required: false,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            pattern: None,
            enum_values: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::String).describe(description)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(name, ParamType::Number).describe(description).range(min, max)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(name, ParamType::Integer)
            .describe(description)
            .range(min as f64, max as f64)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean).describe(description)
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.minimum = Some(min);
        self.maximum = Some(max);
        self
    }

    pub fn length(mut self, min: u32, max: u32) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }
}

/// Renders a single parameter. Bounds only appear for the types they apply to.
pub fn describe_param(schema: &ParamSchema) -> J {
    let mut out = Map::new();
    out.insert("type".into(), json!(schema.kind.as_str()));
    if let Some(desc) = &schema.description {
        out.insert("description".into(), json!(desc));
    }

    if schema.kind.is_numeric() {
        let bound = |v: f64| {
            if schema.kind == ParamType::Integer {
                json!(v as i64)
            } else {
                json!(v)
            }
        };
        if let Some(min) = schema.minimum {
            out.insert("minimum".into(), bound(min));
        }
        if let Some(max) = schema.maximum {
            out.insert("maximum".into(), bound(max));
        }
    }

    if schema.kind == ParamType::String {
        if let Some(min) = schema.min_length {
            out.insert("minLength".into(), json!(min));
        }
        if let Some(max) = schema.max_length {
            out.insert("maxLength".into(), json!(max));
        }
        if let Some(pattern) = &schema.pattern {
            out.insert("pattern".into(), json!(pattern));
        }
    }

    if !schema.enum_values.is_empty() {
        out.insert("enum".into(), json!(schema.enum_values));
    }

    J::Object(out)
}

/// Renders an `inputSchema` object. Properties keep declaration order.
pub fn describe_parameters(params: &[ParamSchema]) -> J {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for p in params {
        properties.insert(p.name.clone(), describe_param(p));
        if p.required {
            required.push(J::String(p.name.clone()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_bounds_are_rendered_as_floats() {
        let p = ParamSchema::number("temperature", "Target temperature", 40.0, 90.5).required();
        let v = describe_param(&p);
        assert_eq!(v["type"], "number");
        assert_eq!(v["description"], "Target temperature");
        assert_eq!(v["minimum"], 40.0);
        assert_eq!(v["maximum"], 90.5);
        assert!(v.get("minLength").is_none());
    }

    #[test]
    fn integer_bounds_are_rendered_as_integers() {
        let p = ParamSchema::integer("count", "How many", 1, 10);
        let v = describe_param(&p);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"type":"integer","description":"How many","minimum":1,"maximum":10}"#);
    }

    #[test]
    fn string_constraints_and_enum() {
        let p = ParamSchema::string("mode", "Fan mode")
            .length(2, 4)
            .pattern("^[a-z]+$")
            .one_of(["auto", "on"]);
        let v = describe_param(&p);
        assert_eq!(v["minLength"], 2);
        assert_eq!(v["maxLength"], 4);
        assert_eq!(v["pattern"], "^[a-z]+$");
        assert_eq!(v["enum"], json!(["auto", "on"]));
    }

    #[test]
    fn string_bounds_are_ignored_for_other_types() {
        let mut p = ParamSchema::boolean("flag", "A flag").length(1, 2);
        p.minimum = Some(3.0);
        let v = describe_param(&p);
        assert!(v.get("minLength").is_none());
        assert!(v.get("minimum").is_none());
    }

    #[test]
    fn parameters_keep_order_and_collect_required() {
        let params = vec![
            ParamSchema::string("zeta", "last letter").required(),
            ParamSchema::boolean("alpha", "first letter"),
            ParamSchema::integer("mid", "middle", 0, 5).required(),
        ];
        let v = describe_parameters(&params);
        assert_eq!(v["type"], "object");
        let keys: Vec<&String> = v["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(v["required"], json!(["zeta", "mid"]));
    }

    #[test]
    fn empty_parameter_list_is_an_empty_object_schema() {
        let v = describe_parameters(&[]);
        assert_eq!(v, json!({"type":"object","properties":{},"required":[]}));
    }
}
