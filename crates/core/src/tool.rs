//! Functions the model can call during text operations.

use std::fmt::{self, Debug};
use std::pin::Pin;
use std::sync::Arc;

use agency_model::ModelTool;
use schemars::{JsonSchema, schema_for};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::Instrument;

use crate::{BoxError, Error};

type FuncFuture = Pin<Box<dyn Future<Output = Result<String, Error>> + Send>>;
type BodyFn = Arc<dyn Fn(Vec<u8>) -> FuncFuture + Send + Sync>;

/// A function definition exposed to the model.
///
/// The body receives the raw argument bytes exactly as the model produced
/// them, and its result is serialized to JSON before being sent back.
#[derive(Clone)]
pub struct FuncDef {
    name: String,
    description: String,
    parameters: Option<Value>,
    body_fn: BodyFn,
}

impl FuncDef {
    /// Creates a function definition without a parameter schema.
    ///
    /// Use [`FuncDef::with_parameters`] to describe the arguments, otherwise
    /// the model sees an object schema without properties.
    pub fn new<F, Fut, T, E>(
        name: impl Into<String>,
        description: impl Into<String>,
        body: F,
    ) -> Self
    where
        F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let name = name.into();
        let body_fn: BodyFn = {
            let name = name.clone();
            Arc::new(move |arguments| {
                let fut = body(arguments);
                let name = name.clone();
                Box::pin(
                    async move {
                        let output = fut
                            .await
                            .map_err(|err| Error::function_failed(&name, err.into()))?;
                        serde_json::to_string(&output)
                            .map_err(|err| Error::serialization(&name, err))
                    }
                    .instrument(debug_span!("func call")),
                )
            })
        };
        Self {
            name,
            description: description.into(),
            parameters: None,
            body_fn,
        }
    }

    /// Creates a function definition whose arguments are decoded into `I`.
    ///
    /// The parameter schema is generated from `I`. Arguments that fail to
    /// decode are reported as a failed call.
    pub fn typed<I, F, Fut, T, E>(
        name: impl Into<String>,
        description: impl Into<String>,
        body: F,
    ) -> Self
    where
        I: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let parameters = schema_for!(I).to_value();
        let body = Arc::new(body);
        Self::new(name, description, move |arguments: Vec<u8>| {
            let body = Arc::clone(&body);
            async move {
                let input: I =
                    serde_json::from_slice(&arguments).map_err(|err| -> BoxError {
                        format!("invalid arguments: {err}").into()
                    })?;
                body(input).await.map_err(Into::<BoxError>::into)
            }
        })
        .with_parameters(parameters)
    }

    /// Sets the JSON schema of the arguments.
    #[inline]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Returns the name of the function.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description of the function.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the JSON schema of the arguments, if any.
    #[inline]
    pub fn parameters(&self) -> Option<&Value> {
        self.parameters.as_ref()
    }

    pub(crate) fn to_model_tool(&self) -> ModelTool {
        ModelTool {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self
                .parameters
                .clone()
                .unwrap_or_else(|| json!({ "type": "object" })),
        }
    }

    /// Calls the body and returns the JSON encoded result.
    pub(crate) async fn call(&self, arguments: Vec<u8>) -> Result<String, Error> {
        (self.body_fn)(arguments).await
    }
}

impl Debug for FuncDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncDef")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Finds a definition by name. The first match wins.
pub(crate) fn find_func<'a>(defs: &'a [FuncDef], name: &str) -> Option<&'a FuncDef> {
    defs.iter().find(|def| def.name == name)
}
