//! A model provider for OpenAI-compatible APIs.
//!
//! Besides chat completions (plain or streamed, with tools and image
//! inputs), the provider also implements speech synthesis through the
//! `/audio/speech` endpoint.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use agency_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
    SpeechProvider, SpeechRequest,
};
use mime::Mime;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use io::{Chunks, Sse};
use proto::{ChatCompletion, ErrorBody};
pub use response::OpenAIResponse;

/// Error type for [`OpenAIProvider`].
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

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .post(format!("{}{}", self.config.base_url, path))
            .bearer_auth(&self.config.api_key);
        if let Some(org) = &self.config.organization {
            builder = builder.header("OpenAI-Organization", org);
        }
        builder
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let stream = openai_req.is_stream();
        let accept = if stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        let resp_fut = self
            .post("/chat/completions")
            .header(header::ACCEPT, accept)
            .json(&openai_req)
            .send();

        async move {
            let resp = check_response(resp_fut.await).await?;

            if !stream {
                let completion: ChatCompletion =
                    resp.json().await.map_err(|err| {
                        Error::new(format!("{err}"), ErrorKind::Other)
                    })?;
                debug!("got {} choice(s)", completion.choices.len());
                return Ok(OpenAIResponse::from_completion(completion));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| {
                    m.type_() == mime::TEXT && m.subtype() == mime::EVENT_STREAM
                })
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(OpenAIResponse::from_sse(sse))
        }
    }
}

impl SpeechProvider for OpenAIProvider {
    type Error = Error;

    fn synthesize(
        &self,
        req: &SpeechRequest,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send + 'static {
        let resp_fut = self.post("/audio/speech").json(req).send();

        async move {
            let resp = check_response(resp_fut.await).await?;
            let audio = resp
                .bytes()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
            debug!("received {} bytes of audio", audio.len());
            Ok(audio.to_vec())
        }
    }
}

/// Turns transport failures and non-success statuses into [`Error`]s.
async fn check_response(
    resp_or_err: reqwest::Result<Response>,
) -> Result<Response, Error> {
    let resp = resp_or_err
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let (message, code) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error }) => (error.message, error.code),
        Err(_) => (body, None),
    };
    let kind = match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        _ if code.as_deref() == Some("content_policy_violation")
            || code.as_deref() == Some("content_filter") =>
        {
            ErrorKind::Moderated
        }
        _ => ErrorKind::Other,
    };
    error!("request failed with {status}: {message}");
    Err(Error::new(format!("{status}: {message}"), kind))
}
