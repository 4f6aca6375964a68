//! Declarative response schemas for schema-constrained generation.
//!
//! Each schema is a static tree of `SchemaNode`s. The Gemini wire form is
//! rendered once on first use and cached; `validate_all` runs at startup
//! and checks the trees plus the fallback payload against them.

use serde_json::{json, Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

use super::types::ReconstructionResult;

/// One node of a response schema. Every object property is required.
#[derive(Debug)]
pub enum SchemaNode {
    String,
    Integer,
    Array(&'static SchemaNode),
    /// Array that must hold at least one item (`minItems: 1`).
    NonEmptyArray(&'static SchemaNode),
    Object(&'static [Property]),
}

#[derive(Debug)]
pub struct Property {
    pub name: &'static str,
    pub node: SchemaNode,
}

/// A named root schema with its lazily rendered wire form.
pub struct ResponseSchema {
    pub name: &'static str,
    pub root: &'static SchemaNode,
    rendered: OnceLock<Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{path}: object declares no properties")]
    EmptyObject { path: String },
    #[error("{path}: property '{name}' declared twice")]
    DuplicateProperty { path: String, name: String },
    #[error("{path}: expected {expected}")]
    TypeMismatch { path: String, expected: &'static str },
    #[error("{path}: missing required property '{name}'")]
    MissingProperty { path: String, name: String },
    #[error("{path}: array must not be empty")]
    EmptyArray { path: String },
}

impl ResponseSchema {
    pub const fn new(name: &'static str, root: &'static SchemaNode) -> Self {
        Self {
            name,
            root,
            rendered: OnceLock::new(),
        }
    }

    /// Gemini `responseSchema` JSON, rendered on first call.
    pub fn wire(&self) -> &Value {
        self.rendered.get_or_init(|| self.root.to_gemini())
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        self.root.validate(self.name)
    }

    /// Structural check of a JSON value against this schema.
    pub fn check(&self, value: &Value) -> Result<(), SchemaError> {
        self.root.check(value, self.name)
    }

    /// Top-level property names, in declaration order.
    pub fn top_level_names(&self) -> Vec<&'static str> {
        match self.root {
            SchemaNode::Object(props) => props.iter().map(|p| p.name).collect(),
            _ => Vec::new(),
        }
    }
}

impl SchemaNode {
    fn type_name(&self) -> &'static str {
        match self {
            SchemaNode::String => "STRING",
            SchemaNode::Integer => "INTEGER",
            SchemaNode::Array(_) | SchemaNode::NonEmptyArray(_) => "ARRAY",
            SchemaNode::Object(_) => "OBJECT",
        }
    }

    fn to_gemini(&self) -> Value {
        match self {
            SchemaNode::String | SchemaNode::Integer => json!({ "type": self.type_name() }),
            SchemaNode::Array(items) => json!({
                "type": self.type_name(),
                "items": items.to_gemini(),
            }),
            SchemaNode::NonEmptyArray(items) => json!({
                "type": self.type_name(),
                "items": items.to_gemini(),
                "minItems": 1,
            }),
            SchemaNode::Object(props) => {
                let mut properties = Map::new();
                for prop in props.iter() {
                    properties.insert(prop.name.to_string(), prop.node.to_gemini());
                }
                let names: Vec<&str> = props.iter().map(|p| p.name).collect();
                json!({
                    "type": self.type_name(),
                    "properties": properties,
                    "required": names,
                    "propertyOrdering": names,
                })
            }
        }
    }

    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        match self {
            SchemaNode::String | SchemaNode::Integer => Ok(()),
            SchemaNode::Array(items) | SchemaNode::NonEmptyArray(items) => {
                items.validate(&format!("{}[]", path))
            }
            SchemaNode::Object(props) => {
                if props.is_empty() {
                    return Err(SchemaError::EmptyObject {
                        path: path.to_string(),
                    });
                }
                for (i, prop) in props.iter().enumerate() {
                    if props[..i].iter().any(|p| p.name == prop.name) {
                        return Err(SchemaError::DuplicateProperty {
                            path: path.to_string(),
                            name: prop.name.to_string(),
                        });
                    }
                    prop.node.validate(&format!("{}.{}", path, prop.name))?;
                }
                Ok(())
            }
        }
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), SchemaError> {
        let mismatch = || SchemaError::TypeMismatch {
            path: path.to_string(),
            expected: self.type_name(),
        };
        match self {
            SchemaNode::String => value.as_str().map(|_| ()).ok_or_else(mismatch),
            SchemaNode::Integer => value.as_i64().map(|_| ()).ok_or_else(mismatch),
            SchemaNode::Array(items) | SchemaNode::NonEmptyArray(items) => {
                let array = value.as_array().ok_or_else(mismatch)?;
                if array.is_empty() && matches!(self, SchemaNode::NonEmptyArray(_)) {
                    return Err(SchemaError::EmptyArray {
                        path: path.to_string(),
                    });
                }
                for (i, item) in array.iter().enumerate() {
                    items.check(item, &format!("{}[{}]", path, i))?;
                }
                Ok(())
            }
            SchemaNode::Object(props) => {
                let object = value.as_object().ok_or_else(mismatch)?;
                for prop in props.iter() {
                    let child = object.get(prop.name).ok_or_else(|| {
                        SchemaError::MissingProperty {
                            path: path.to_string(),
                            name: prop.name.to_string(),
                        }
                    })?;
                    prop.node.check(child, &format!("{}.{}", path, prop.name))?;
                }
                Ok(())
            }
        }
    }
}

const STRING_LIST: SchemaNode = SchemaNode::Array(&SchemaNode::String);

static RECONSTRUCTION_ROOT: SchemaNode = SchemaNode::Object(&[
    Property {
        name: "process_overview",
        node: SchemaNode::Object(&[
            Property { name: "process_name", node: SchemaNode::String },
            Property { name: "role", node: SchemaNode::String },
            Property { name: "system_type", node: SchemaNode::String },
            Property { name: "goal", node: SchemaNode::String },
            Property { name: "assumptions", node: STRING_LIST },
        ]),
    },
    Property {
        name: "steps",
        node: SchemaNode::NonEmptyArray(&SchemaNode::Object(&[
            Property { name: "step", node: SchemaNode::Integer },
            Property { name: "title", node: SchemaNode::String },
            Property { name: "instruction", node: SchemaNode::String },
        ])),
    },
    Property {
        name: "checks_and_risks",
        node: SchemaNode::Object(&[
            Property { name: "checks", node: STRING_LIST },
            Property { name: "risks", node: STRING_LIST },
        ]),
    },
    Property { name: "execution_checklist", node: STRING_LIST },
    Property {
        name: "loom_script",
        node: SchemaNode::Array(&SchemaNode::Object(&[
            Property { name: "step", node: SchemaNode::Integer },
            Property { name: "narration", node: SchemaNode::String },
            Property { name: "focus", node: SchemaNode::String },
        ])),
    },
]);

static SOP_ROOT: SchemaNode = SchemaNode::Object(&[
    Property {
        name: "overview",
        node: SchemaNode::Object(&[
            Property { name: "processName", node: SchemaNode::String },
            Property { name: "role", node: SchemaNode::String },
            Property { name: "systemType", node: SchemaNode::String },
            Property { name: "goal", node: SchemaNode::String },
        ]),
    },
    Property { name: "steps", node: STRING_LIST },
    Property {
        name: "risks",
        node: SchemaNode::Array(&SchemaNode::Object(&[
            Property { name: "check", node: SchemaNode::String },
            Property { name: "risk", node: SchemaNode::String },
        ])),
    },
    Property { name: "checklist", node: STRING_LIST },
    Property {
        name: "loomScript",
        node: SchemaNode::Array(&SchemaNode::Object(&[
            Property { name: "step", node: SchemaNode::String },
            Property { name: "narration", node: SchemaNode::String },
            Property { name: "focus", node: SchemaNode::String },
        ])),
    },
]);

/// Schema for `ReconstructionResult` (multi-image SOP).
pub static RECONSTRUCTION_SCHEMA: ResponseSchema =
    ResponseSchema::new("ReconstructionResult", &RECONSTRUCTION_ROOT);

/// Schema for `SopData` (single-screenshot analysis).
pub static SOP_SCHEMA: ResponseSchema = ResponseSchema::new("SopData", &SOP_ROOT);

/// Startup check: both schemas are well-formed and the fallback payload
/// satisfies the reconstruction schema.
pub fn validate_all() -> Result<(), SchemaError> {
    RECONSTRUCTION_SCHEMA.validate()?;
    SOP_SCHEMA.validate()?;

    let fallback = serde_json::to_value(ReconstructionResult::fallback()).map_err(|_| {
        SchemaError::TypeMismatch {
            path: "fallback".to_string(),
            expected: "OBJECT",
        }
    })?;
    RECONSTRUCTION_SCHEMA.check(&fallback)?;

    // Force rendering now so the first request pays nothing.
    RECONSTRUCTION_SCHEMA.wire();
    SOP_SCHEMA.wire();
    Ok(())
}
