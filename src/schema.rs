use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::object::ActorId;

/// The read surfaces a client asks the store for. Each view compiles
/// to one predicate; the store does the filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum View {
    /// Group creation records in the lobby channel.
    GroupListing,
    /// Everything published into one group's channel: messages and
    /// name overlays alike.
    Timeline,
    /// Profile records in an actor's own channel.
    Profile,
    /// Messages liked by one actor.
    LikeSearch(ActorId),
}

impl View {
    pub fn schema(&self) -> Schema {
        match self {
            View::GroupListing => Schema::with(
                &["activity", "object", "published"],
                vec![
                    ("activity", Constraint::exactly("Create")),
                    (
                        "object",
                        Constraint::nested(Schema::with(
                            &["type", "name", "channel"],
                            vec![
                                ("type", Constraint::exactly("Group")),
                                ("name", Constraint::string()),
                                ("channel", Constraint::string()),
                            ],
                        )),
                    ),
                    ("published", Constraint::number()),
                ],
            ),
            View::Timeline => Schema::with(
                &["published"],
                vec![
                    ("content", Constraint::string()),
                    ("audio", Constraint::string()),
                    ("published", Constraint::number()),
                ],
            ),
            View::Profile => Schema::with(
                &["type"],
                vec![
                    ("type", Constraint::exactly("Profile")),
                    ("name", Constraint::string()),
                    ("pronouns", Constraint::string()),
                    ("published", Constraint::number()),
                ],
            ),
            View::LikeSearch(actor) => Schema::with(
                &["published", "likes"],
                vec![
                    ("published", Constraint::number()),
                    ("likes", Constraint::contains(Constraint::exactly(actor.as_str()))),
                ],
            ),
        }
    }
}

/// Subset of JSON Schema the store understands: `required` field names
/// plus per-field constraints. A field named in `properties` but
/// absent from the value passes; `required` is what forces presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Constraint>,
}

impl Schema {
    fn with(required: &[&str], properties: Vec<(&str, Constraint)>) -> Self {
        Self {
            required: required.iter().map(|field| (*field).to_owned()).collect(),
            properties: properties
                .into_iter()
                .map(|(field, constraint)| (field.to_owned(), constraint))
                .collect(),
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        let Some(map) = value.as_object() else {
            return self.required.is_empty() && self.properties.is_empty();
        };
        self.required.iter().all(|field| map.contains_key(field))
            && self
                .properties
                .iter()
                .all(|(field, constraint)| {
                    map.get(field).is_none_or(|v| constraint.matches(v))
                })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constraint {
    Type {
        #[serde(rename = "type")]
        kind: SchemaType,
    },
    Const {
        #[serde(rename = "const")]
        value: Value,
    },
    Contains {
        contains: Box<Constraint>,
    },
    Nested(Schema),
}

impl Constraint {
    pub fn string() -> Self {
        Self::Type { kind: SchemaType::String }
    }

    pub fn number() -> Self {
        Self::Type { kind: SchemaType::Number }
    }

    pub fn exactly(value: impl Into<Value>) -> Self {
        Self::Const { value: value.into() }
    }

    pub fn contains(inner: Constraint) -> Self {
        Self::Contains { contains: Box::new(inner) }
    }

    pub fn nested(schema: Schema) -> Self {
        Self::Nested(schema)
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Constraint::Type { kind } => kind.matches(value),
            Constraint::Const { value: expected } => value == expected,
            Constraint::Contains { contains } => value
                .as_array()
                .is_some_and(|items| items.iter().any(|item| contains.matches(item))),
            Constraint::Nested(schema) => schema.matches(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    fn matches(self, value: &Value) -> bool {
        match self {
            SchemaType::String => value.is_string(),
            SchemaType::Number => value.is_number(),
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Array => value.is_array(),
            SchemaType::Object => value.is_object(),
        }
    }
}
