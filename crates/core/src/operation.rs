use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::pin::Pin;
use std::sync::Arc;

use tracing::Instrument;

use crate::config::{self, OperationConfig, OperationOption};
use crate::{Error, Message, Process};

type OperationFuture =
    Pin<Box<dyn Future<Output = Result<Message, Error>> + Send>>;
type HandlerFn =
    Arc<dyn Fn(Message, OperationConfig) -> OperationFuture + Send + Sync>;

/// A single unit of work: a message comes in, a message comes out.
///
/// An operation is a handler plus the options it was configured with.
/// Configuring an operation returns a new value, the handler itself is
/// shared, so the same operation can be specialized many times cheaply.
#[derive(Clone)]
pub struct Operation {
    name: Cow<'static, str>,
    handler_fn: HandlerFn,
    options: Vec<OperationOption>,
}

impl Operation {
    /// Creates an operation from a handler.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Message, OperationConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Message, Error>> + Send + 'static,
    {
        let handler_fn: HandlerFn =
            Arc::new(move |msg, config| Box::pin(handler(msg, config)));
        Self {
            name: Cow::Borrowed("operation"),
            handler_fn,
            options: vec![],
        }
    }

    /// Sets the name used in logs.
    #[inline]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the name used in logs.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the prompt.
    #[inline]
    pub fn with_prompt(self, prompt: impl Into<String>) -> Self {
        self.with_options([config::prompt(prompt)])
    }

    /// Appends prior conversation messages.
    #[inline]
    pub fn with_messages(self, messages: impl Into<Vec<Message>>) -> Self {
        self.with_options([config::messages(messages)])
    }

    /// Appends arbitrary options, applied after the existing ones.
    pub fn with_options(
        mut self,
        options: impl IntoIterator<Item = OperationOption>,
    ) -> Self {
        self.options.extend(options);
        self
    }

    /// Returns the configuration the handler will receive.
    #[inline]
    pub fn config(&self) -> OperationConfig {
        OperationConfig::from_options(&self.options)
    }

    /// Runs the handler with the input message.
    pub async fn execute(&self, msg: Message) -> Result<Message, Error> {
        let config = self.config();
        let span = debug_span!("operation", name = %self.name);
        let result = (self.handler_fn)(msg, config).instrument(span).await;
        if let Err(err) = &result {
            debug!("operation {} failed: {err}", self.name);
        }
        result
    }

    /// Chains another operation after this one.
    #[inline]
    pub fn then(self, next: Operation) -> Process {
        Process::from(self).then(next)
    }
}

impl Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
