
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::schema::ErrorMessage;
use crate::{Error, ErrorKind};

/// A semantic search over the objects of one class.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NearTextQuery {
    /// The class to search.
    pub class: String,
    /// The properties to return.
    pub fields: Vec<String>,
    /// The concepts the results should be close to.
    pub concepts: Vec<String>,
    /// The maximum number of results.
    pub limit: Option<u32>,
    /// The maximum vector distance of results.
    pub distance: Option<f32>,
}

impl NearTextQuery {
    /// Creates a query over `class` returning `fields`.
    pub fn new<I, S>(class: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class: class.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Adds a concept.
    #[inline]
    pub fn with_concept<S: Into<String>>(mut self, concept: S) -> Self {
        self.concepts.push(concept.into());
        self
    }

    /// Sets the maximum number of results.
    #[inline]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the maximum vector distance of results.
    #[inline]
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Builds the GraphQL document of the query.
    pub fn to_document(&self) -> Result<String, Error> {
        check_name(&self.class)?;
        if self.fields.is_empty() {
            return Err(Error::new(
                "a query needs at least one field",
                ErrorKind::InvalidQuery,
            ));
        }
        for field in &self.fields {
            check_name(field)?;
        }

        // JSON string literals are valid GraphQL string literals.
        let concepts = serde_json::to_string(&self.concepts)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::InvalidQuery))?;
        let mut args = format!("nearText: {{concepts: {concepts}");
        if let Some(distance) = self.distance {
            args.push_str(&format!(", distance: {distance}"));
        }
        args.push('}');
        if let Some(limit) = self.limit {
            args.push_str(&format!(", limit: {limit}"));
        }
        Ok(format!(
            "{{ Get {{ {}({args}) {{ {} }} }} }}",
            self.class,
            self.fields.join(" ")
        ))
    }
}

fn check_name(name: &str) -> Result<(), Error> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|ch| ch == '_' || ch.is_ascii_alphabetic())
        && chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(Error::new(
            format!("invalid GraphQL name: {name:?}"),
            ErrorKind::InvalidQuery,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQLResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<ErrorMessage>,
}

impl GraphQLResponse {
    /// Returns the objects found for `class`.
    pub fn into_objects(self, class: &str) -> Result<Vec<Map<String, Value>>, Error> {
        if !self.errors.is_empty() {
            let messages: Vec<_> =
                self.errors.into_iter().map(|err| err.message).collect();
            return Err(Error::new(messages.join("; "), ErrorKind::GraphQL));
        }
        let objects = match self
            .data
            .as_ref()
            .and_then(|data| data.get("Get"))
            .and_then(|get| get.get(class))
        {
            Some(Value::Array(objects)) => objects,
            Some(Value::Null) | None => return Ok(vec![]),
            Some(other) => {
                return Err(Error::new(
                    format!("unexpected result for {class}: {other}"),
                    ErrorKind::Decode,
                ));
            }
        };
        Ok(objects
            .iter()
            .filter_map(|object| object.as_object().cloned())
            .collect())
    }
}
