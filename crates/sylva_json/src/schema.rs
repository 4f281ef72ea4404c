//! JSON-Schema draft 4 documents.
//!
//! Only the structure is modelled here; [`translate`](crate::translate)
//! decides which keywords it supports. Keywords that accept more than one
//! JSON shape (`type`, `additionalProperties`, `items`, `dependencies`)
//! are untagged enums.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sylva_foundation::{Error, ErrorKind, Result};

/// A draft 4 schema. Fields mirror the keywords of the same name.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub meta_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    // Numeric
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_maximum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_minimum: bool,

    // String
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "is_zero")]
    pub min_length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    // Array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<Additional>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "is_zero")]
    pub min_items: u64,
    #[serde(skip_serializing_if = "is_false")]
    pub unique_items: bool,

    // Object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(skip_serializing_if = "is_zero")]
    pub min_properties: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Additional>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<BTreeMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<BTreeMap<String, Dependency>>,

    // Instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<BTreeMap<String, Schema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeSet>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Schema {
    /// True if any of `multipleOf`, `maximum` or `minimum` is present.
    #[must_use]
    pub fn has_numeric_constraints(&self) -> bool {
        self.multiple_of.is_some() || self.maximum.is_some() || self.minimum.is_some()
    }

    /// True if any of `maxLength`, a nonzero `minLength` or `pattern` is present.
    #[must_use]
    pub fn has_string_constraints(&self) -> bool {
        self.max_length.is_some() || self.min_length > 0 || self.pattern.is_some()
    }

    /// True if any array keyword is present.
    #[must_use]
    pub fn has_array_constraints(&self) -> bool {
        self.additional_items.is_some()
            || self.items.is_some()
            || self.max_items.is_some()
            || self.min_items > 0
            || self.unique_items
    }

    /// True if any object keyword is present.
    #[must_use]
    pub fn has_object_constraints(&self) -> bool {
        self.max_properties.is_some()
            || self.min_properties > 0
            || self.required.is_some()
            || self.additional_properties.is_some()
            || self.properties.is_some()
            || self.pattern_properties.is_some()
            || self.dependencies.is_some()
    }

    /// True if any of `definitions`, `enum`, `allOf`, `anyOf`, `oneOf` or
    /// `not` is present and non-empty.
    #[must_use]
    pub fn has_instance_constraints(&self) -> bool {
        self.definitions.as_ref().is_some_and(|d| !d.is_empty())
            || self.enumeration.as_ref().is_some_and(|e| !e.is_empty())
            || self.all_of.as_ref().is_some_and(|s| !s.is_empty())
            || self.any_of.as_ref().is_some_and(|s| !s.is_empty())
            || self.one_of.as_ref().is_some_and(|s| !s.is_empty())
            || self.not.is_some()
    }

    /// The declared types, empty when `type` is absent.
    #[must_use]
    pub fn types(&self) -> &[SimpleType] {
        match &self.ty {
            Some(set) => set.as_slice(),
            None => &[],
        }
    }
}

/// One of the seven draft 4 primitive types.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl fmt::Display for SimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Array => "array",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Null => "null",
            Self::Number => "number",
            Self::Object => "object",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

/// The `type` keyword: one type or a list of distinct types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TypeSetRepr", into = "TypeSetRepr")]
pub struct TypeSet(Vec<SimpleType>);

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TypeSetRepr {
    Single(SimpleType),
    Many(Vec<SimpleType>),
}

impl TypeSet {
    /// The types in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[SimpleType] {
        &self.0
    }

    /// True if exactly one type is declared.
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.0.len() == 1
    }

    /// True if `ty` is one of the declared types.
    #[must_use]
    pub fn has(&self, ty: SimpleType) -> bool {
        self.0.contains(&ty)
    }
}

impl TryFrom<TypeSetRepr> for TypeSet {
    type Error = String;

    fn try_from(repr: TypeSetRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            TypeSetRepr::Single(ty) => Ok(Self(vec![ty])),
            TypeSetRepr::Many(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if types[..i].contains(ty) {
                        return Err(format!("type alternatives are not unique, duplicate {ty} found"));
                    }
                }
                Ok(Self(types))
            }
        }
    }
}

impl From<TypeSet> for TypeSetRepr {
    fn from(set: TypeSet) -> Self {
        match set.0.as_slice() {
            [single] => Self::Single(*single),
            _ => Self::Many(set.0),
        }
    }
}

/// `additionalItems` / `additionalProperties`: a flag or a schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Additional {
    /// `true` allows anything, `false` nothing.
    Allowed(bool),
    /// Every additional entry must match.
    Schema(Box<Schema>),
}

/// `items`: a list of positional schemas, or one schema for every item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    /// One schema per position.
    Positional(Vec<Schema>),
    /// One schema for all items.
    Each(Box<Schema>),
}

/// A `dependencies` entry: required sibling names, or a schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    /// Properties that must be present alongside the key.
    Properties(Vec<String>),
    /// A schema the whole object must match when the key is present.
    Schema(Box<Schema>),
}

/// Parses a schema document.
///
/// # Errors
/// Returns a parse error with the line and column serde_json reports.
pub fn parse_schema(bytes: &[u8]) -> Result<Schema> {
    serde_json::from_slice(bytes).map_err(|e| {
        Error::new(ErrorKind::ParseError {
            message: e.to_string(),
            line: u32::try_from(e.line()).unwrap_or(u32::MAX),
            column: u32::try_from(e.column()).unwrap_or(u32::MAX),
            context: String::new(),
        })
    })
}
