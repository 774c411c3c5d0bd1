use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use agency_model::{
    ModelFinishReason, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent, SpeechProvider, SpeechRequest, ToolCallRequest,
};
use tracing::Instrument;

use crate::{BoxError, Error};

/// A callback receiving each text fragment as it arrives.
pub(crate) type DeltaCallback =
    Arc<dyn Fn(&str) -> Result<(), BoxError> + Send + Sync>;

type SendRequestResult = Result<ModelClientResponse, Error>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Option<DeltaCallback>)
        -> BoxedSendRequestFuture + Send + Sync
>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the operations.
#[derive(Clone)]
pub(crate) struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since operations are stored as
        // plain values and can't carry the provider type around.
        let handler_fn: HandlerFn = Arc::new(move |req, on_delta| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_delta).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and collects the whole response.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: Option<DeltaCallback>,
    ) -> SendRequestResult {
        (self.handler_fn)(req, on_delta).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug, Default)]
pub(crate) struct ModelClientResponse {
    pub content: String,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

impl ModelClientResponse {
    /// Returns `true` if the provider answered without any choice.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.finish_reason.is_none()
            && self.content.is_empty()
            && self.tool_calls.is_empty()
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_delta: Option<DeltaCallback>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Error::remote(err));
        }
    };

    let mut collected = ModelClientResponse::default();

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Error::remote(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                if let Some(on_delta) = &on_delta {
                    // Dropping the response here stops the stream.
                    on_delta(&delta).map_err(Error::callback)?;
                }
                collected.content.push_str(&delta);
            }
            ModelResponseEvent::ToolCall(req) => {
                collected.tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                collected.finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(collected)
}

type SynthesizeResult = Result<Vec<u8>, Error>;
type SynthesizeFn = Arc<
    dyn Fn(SpeechRequest) -> Pin<Box<dyn Future<Output = SynthesizeResult> + Send>>
        + Send
        + Sync,
>;

/// The type-erased counterpart of [`ModelClient`] for speech providers.
#[derive(Clone)]
pub(crate) struct SpeechClient {
    synthesize_fn: SynthesizeFn,
}

impl SpeechClient {
    pub fn new<S: SpeechProvider + 'static>(provider: S) -> Self {
        let synthesize_fn: SynthesizeFn = Arc::new(move |req| {
            let fut = provider.synthesize(&req);
            Box::pin(
                async move {
                    trace!("synthesizing {} chars", req.input.len());
                    fut.await.map_err(|err| {
                        error!("got an error: {err:?}");
                        Error::remote(err)
                    })
                }
                .instrument(trace_span!("speech client req")),
            )
        });
        Self { synthesize_fn }
    }

    #[inline]
    pub async fn synthesize(&self, req: SpeechRequest) -> SynthesizeResult {
        (self.synthesize_fn)(req).await
    }
}
