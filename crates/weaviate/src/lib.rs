//! A small client for the Weaviate vector database: schema creation,
//! batch imports and semantic search.

#[macro_use]
extern crate tracing;

mod config;
mod graphql;
mod schema;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

pub use config::WeaviateConfig;
use graphql::GraphQLResponse;
pub use graphql::NearTextQuery;
pub use schema::{BatchObjectResult, Class, Object, Property};

/// The kind of a [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request didn't reach the server or the connection broke.
    Transport,
    /// The server answered with a non-success status.
    Status(u16),
    /// Some objects of a batch were rejected.
    Batch,
    /// The GraphQL response carried errors.
    GraphQL,
    /// The query can't be expressed as a GraphQL document.
    InvalidQuery,
    /// The response body was not what we expected.
    Decode,
}

/// Error type for [`WeaviateClient`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the kind of the error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Status(status) => write!(f, "{status}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

impl StdError for Error {}

/// A Weaviate REST and GraphQL client.
#[derive(Clone, Debug)]
pub struct WeaviateClient {
    client: Client,
    config: Arc<WeaviateConfig>,
}

impl WeaviateClient {
    /// Creates a client with the given configuration.
    #[inline]
    pub fn new(config: WeaviateConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this client.
    #[inline]
    pub fn config(&self) -> &WeaviateConfig {
        &self.config
    }

    /// Creates a class.
    pub async fn create_class(&self, class: &Class) -> Result<Class, Error> {
        debug!("creating class {}", class.class);
        let resp = self.send(self.post("/v1/schema").json(class)).await?;
        decode(resp).await
    }

    /// Imports objects in one batch.
    ///
    /// Fails if any object was rejected, the error lists every rejection.
    pub async fn batch_objects(
        &self,
        objects: &[Object],
    ) -> Result<Vec<BatchObjectResult>, Error> {
        debug!("importing {} object(s)", objects.len());
        let body = json!({ "objects": objects });
        let resp = self.send(self.post("/v1/batch/objects").json(&body)).await?;
        let results: Vec<BatchObjectResult> = decode(resp).await?;

        let rejections: Vec<_> = results
            .iter()
            .enumerate()
            .flat_map(|(idx, result)| {
                result.errors().map(move |message| format!("#{idx}: {message}"))
            })
            .collect();
        if !rejections.is_empty() {
            error!("{} object(s) rejected", rejections.len());
            return Err(Error::new(rejections.join("; "), ErrorKind::Batch));
        }
        Ok(results)
    }

    /// Runs a semantic search and returns the requested fields of every
    /// match.
    pub async fn near_text(
        &self,
        query: &NearTextQuery,
    ) -> Result<Vec<Map<String, Value>>, Error> {
        let document = query.to_document()?;
        trace!("graphql query: {document}");
        let resp = self
            .send(self.post("/v1/graphql").json(&json!({ "query": document })))
            .await?;
        let body: GraphQLResponse = decode(resp).await?;
        body.into_objects(&query.class)
    }

    /// Like [`WeaviateClient::near_text`], but decodes every match into `T`.
    pub async fn near_text_as<T: DeserializeOwned>(
        &self,
        query: &NearTextQuery,
    ) -> Result<Vec<T>, Error> {
        self.near_text(query)
            .await?
            .into_iter()
            .map(|object| {
                serde_json::from_value(Value::Object(object))
                    .map_err(|err| Error::new(format!("{err}"), ErrorKind::Decode))
            })
            .collect()
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .post(format!("{}{path}", self.config.base_url()));
        for (name, value) in &self.config.headers {
            builder = builder.header(name, value);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, Error> {
        let resp = builder
            .send()
            .await
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Transport))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        error!("request failed with {status}: {body}");
        Err(Error::new(body, ErrorKind::Status(status.as_u16())))
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    resp.json()
        .await
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::Decode))
}

/// Builds a batch of objects of one class from serializable records.
pub fn objects_from<T: Serialize>(
    class: &str,
    records: &[T],
) -> serde_json::Result<Vec<Object>> {
    records
        .iter()
        .map(|record| Object::from_serialize(class, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Record {
        content: String,
    }

    fn setup_client(server: &MockServer) -> WeaviateClient {
        let host = server.uri().trim_start_matches("http://").to_owned();
        WeaviateClient::new(
            WeaviateConfig::with_host(host).with_header("X-OpenAI-Api-Key", "sk-test"),
        )
    }

    #[tokio::test]
    async fn test_create_class() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .and(header("x-openai-api-key", "sk-test"))
            .and(body_partial_json(json!({
                "class": "Records",
                "vectorizer": "text2vec-openai"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "class": "Records",
                "vectorizer": "text2vec-openai",
                "properties": [{ "name": "content", "dataType": ["text"] }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let class = Class {
            class: "Records".to_owned(),
            vectorizer: Some("text2vec-openai".to_owned()),
            ..Default::default()
        };
        let created = setup_client(&server).create_class(&class).await.unwrap();
        assert_eq!(created.properties[0].data_type, ["text"]);
    }

    #[tokio::test]
    async fn test_create_class_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .respond_with(
                ResponseTemplate::new(422).set_body_string("class already exists"),
            )
            .mount(&server)
            .await;

        let err = setup_client(&server)
            .create_class(&Class::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Status(422));
        assert_eq!(format!("{err}"), "422: class already exists");
    }

    #[tokio::test]
    async fn test_batch_objects() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/batch/objects"))
            .and(body_json(json!({
                "objects": [
                    { "class": "Records", "properties": { "content": "Rust" } },
                    { "class": "Records", "properties": { "content": "Go" } }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "a", "class": "Records", "result": {} },
                {
                    "id": "b",
                    "class": "Records",
                    "result": { "errors": { "error": [{ "message": "quota" }] } }
                }
            ])))
            .mount(&server)
            .await;

        let records = [
            Record { content: "Rust".to_owned() },
            Record { content: "Go".to_owned() },
        ];
        let objects = objects_from("Records", &records).unwrap();
        let err = setup_client(&server).batch_objects(&objects).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Batch);
        assert_eq!(err.message(), "#1: quota");
    }

    #[tokio::test]
    async fn test_near_text() {
        let server = MockServer::start().await;
        let query = NearTextQuery::new("Records", ["content"])
            .with_concept("programming")
            .with_limit(5);
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .and(body_json(json!({ "query": query.to_document().unwrap() })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "Get": {
                        "Records": [
                            { "content": "Rust is a systems language" },
                            { "content": "Go has goroutines" }
                        ]
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records: Vec<Record> =
            setup_client(&server).near_text_as(&query).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content, "Rust is a systems language");
    }
}
