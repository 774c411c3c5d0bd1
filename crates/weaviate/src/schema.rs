use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A class (collection) definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    /// The class name, starting with an uppercase letter.
    pub class: String,
    /// The vectorizer module, for example `text2vec-openai`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectorizer: Option<String>,
    /// Per-module settings, keyed by module name.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub module_config: Map<String, Value>,
    /// Explicit properties. The server infers them from data if empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

/// A property of a class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// The property name.
    pub name: String,
    /// The data types, for example `["text"]`.
    pub data_type: Vec<String>,
}

/// An object stored in a class.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// The class the object belongs to.
    pub class: String,
    /// The object id, generated by the server if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The property values.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Object {
    /// Creates an object from any serializable value.
    ///
    /// Values that don't serialize to a JSON object get no properties.
    pub fn from_serialize<T: Serialize>(
        class: impl Into<String>,
        value: &T,
    ) -> serde_json::Result<Self> {
        let properties = match serde_json::to_value(value)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(Self {
            class: class.into(),
            id: None,
            properties,
        })
    }
}

/// The outcome of one object in a batch.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BatchObjectResult {
    /// The id assigned to the object.
    #[serde(default)]
    pub id: Option<String>,
    /// The class of the object.
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub(crate) result: BatchResult,
}

impl BatchObjectResult {
    /// Returns the error messages reported for this object.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.result
            .errors
            .iter()
            .flat_map(|errors| errors.error.iter())
            .map(|error| error.message.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub(crate) struct BatchResult {
    #[serde(default)]
    errors: Option<BatchErrors>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
struct BatchErrors {
    #[serde(default)]
    error: Vec<ErrorMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct ErrorMessage {
    pub message: String,
}
