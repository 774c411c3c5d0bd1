//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use agency_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, SpeechProvider,
    SpeechRequest,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<ModelResponseEvent>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if this.events.is_empty() {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }

        let delay = this.delay;
        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        Poll::Ready(Ok(this.events.pop_front()))
    }
}

#[derive(Default)]
struct State {
    script: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
    audio: Option<Vec<u8>>,
    speech_requests: Vec<SpeechRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond. Each request consumes one preset response in the
/// order they were added. If the script is exhausted, an error will be
/// returned.
///
/// Every request is recorded, clones of the provider share the same
/// script and records, so a test can keep one clone for inspection while
/// the code under test owns another.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    state: Arc<Mutex<State>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Appends a response to the script.
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.lock().script.push_back(preset);
    }

    /// Sets the audio returned by speech requests.
    #[inline]
    pub fn set_audio(&mut self, audio: impl Into<Vec<u8>>) {
        self.lock().audio = Some(audio.into());
    }

    /// Sets the delay before each event is delivered.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all chat requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Returns all speech requests received so far.
    pub fn speech_requests(&self) -> Vec<SpeechRequest> {
        self.lock().speech_requests.clone()
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut state = self.lock();
        state.requests.push(req.clone());

        let result = 'blk: {
            let Some(preset) = state.script.pop_front() else {
                break 'blk Err(Error {
                    message: "no enough steps",
                    kind: ErrorKind::RateLimitExceeded,
                });
            };
            if let Some(kind) = preset.failure {
                break 'blk Err(Error {
                    message: "preset failure",
                    kind,
                });
            }

            let mut has_tool_call = false;
            let mut events: VecDeque<_> = preset
                .events
                .into_iter()
                .map(|event| match event {
                    PresetEvent::MessageDelta(msg) => {
                        ModelResponseEvent::MessageDelta(msg)
                    }
                    PresetEvent::ToolCall(req) => {
                        has_tool_call = true;
                        ModelResponseEvent::ToolCall(req)
                    }
                })
                .collect();
            if !preset.no_choice {
                events.push_back(ModelResponseEvent::Completed(
                    if has_tool_call {
                        ModelFinishReason::ToolCalls
                    } else {
                        ModelFinishReason::Stop
                    },
                ));
            }
            Ok(TestModelResponse {
                events,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            })
        };
        ready(result)
    }
}

impl SpeechProvider for TestModelProvider {
    type Error = crate::Error;

    fn synthesize(
        &self,
        req: &SpeechRequest,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send + 'static {
        let mut state = self.lock();
        state.speech_requests.push(req.clone());
        let result = state.audio.clone().ok_or(Error {
            message: "no preset audio",
            kind: ErrorKind::Other,
        });
        ready(result)
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TestModelProvider")
            .field("pending_responses", &state.script.len())
            .field("received_requests", &state.requests.len())
            .finish_non_exhaustive()
    }
}
