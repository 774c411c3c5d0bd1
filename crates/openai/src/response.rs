use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use agency_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::Sse;
use crate::proto::{self, ChatCompletion, ChatCompletionChunk, ToolCall};

struct PartialState {
    sse: Sse,
    tool_calls: Vec<ToolCall>,
    // This field records the index of the tool calls that are generated but not
    // yet sent to the model user. They are only flushed once the stream has
    // finished, since their arguments may still be arriving before that.
    pending_tool_call_idx: VecDeque<usize>,
    // This field will be cleared after the response returns the complete event.
    pending_finish_reason: Option<ModelFinishReason>,
    finished: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    /// A response from an OpenAI-compatible chat completion endpoint.
    ///
    /// Streamed responses are decoded lazily from the event stream, while
    /// plain responses are decoded upfront and replayed as events.
    pub struct OpenAIResponse {
        replay: VecDeque<ModelResponseEvent>,
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl OpenAIResponse {
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            tool_calls: Default::default(),
            pending_tool_call_idx: Default::default(),
            pending_finish_reason: Default::default(),
            finished: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            replay: VecDeque::new(),
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }

    pub fn from_completion(completion: ChatCompletion) -> Self {
        let mut replay = VecDeque::new();
        // Only the first choice is used. Without any choice the response
        // produces no events at all.
        if let Some(choice) = completion.choices.into_iter().next() {
            let message = choice.message;
            if let Some(content) = message.content.filter(|c| !c.is_empty()) {
                replay.push_back(ModelResponseEvent::MessageDelta(content));
            }
            let tool_calls = message.tool_calls.unwrap_or_default();
            let has_tool_calls = !tool_calls.is_empty();
            for tool_call in &tool_calls {
                replay.push_back(ModelResponseEvent::ToolCall(
                    tool_call.to_request(),
                ));
            }
            let finish_reason = match choice.finish_reason.as_deref() {
                Some(reason) => proto::parse_finish_reason(reason),
                None if has_tool_calls => ModelFinishReason::ToolCalls,
                None => ModelFinishReason::Stop,
            };
            replay.push_back(ModelResponseEvent::Completed(finish_reason));
        }
        Self {
            replay,
            next_event_fut: None,
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        if let Some(event) = this.replay.pop_front() {
            return Poll::Ready(Ok(Some(event)));
        }

        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut partial_state: PartialState) -> NextEvent {
    let mut message_delta = None;

    while !partial_state.finished {
        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                partial_state.finished = true;
                break;
            }
            Err(err) => {
                return Err(Error::new(format!("{err}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            partial_state.finished = true;
            break;
        }

        let mut chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

        // Some providers send chunks without choices, for example usage
        // reports or content filter results.
        let Some(choice) = chunk.choices.pop() else {
            continue;
        };

        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            message_delta = Some(content);
        }
        if let Some(tool_calls) = choice.delta.tool_calls {
            merge_tool_calls(&mut partial_state, tool_calls);
        }
        if let Some(finish_reason) = choice.finish_reason {
            partial_state.pending_finish_reason =
                Some(proto::parse_finish_reason(&finish_reason));
            partial_state.finished = true;
        }

        if message_delta.is_some() {
            break;
        }
    }

    // The order of events are important. Always emit message delta first, then
    // emit pending tool calls, and finally emit pending finish reason if any.

    if let Some(message_delta) = message_delta {
        return Ok((
            Some(ModelResponseEvent::MessageDelta(message_delta)),
            partial_state,
        ));
    }

    if let Some(idx) = partial_state.pending_tool_call_idx.pop_front() {
        let request = partial_state.tool_calls[idx].to_request();
        return Ok((Some(ModelResponseEvent::ToolCall(request)), partial_state));
    }

    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    Ok((None, partial_state))
}

fn merge_tool_calls(partial_state: &mut PartialState, tool_calls: Vec<ToolCall>) {
    for mut tool_call in tool_calls {
        let pos = match tool_call.index {
            Some(_) => partial_state
                .tool_calls
                .iter()
                .position(|t| t.index == tool_call.index),
            // Without an index, a fragment carrying a new id starts another
            // call and anything else continues the latest one.
            None => partial_state
                .tool_calls
                .iter()
                .rposition(|t| t.index.is_none())
                .filter(|&pos| match &tool_call.id {
                    Some(id) => {
                        partial_state.tool_calls[pos].id.as_ref() == Some(id)
                    }
                    None => true,
                }),
        };
        let Some(partial_tool_call) =
            pos.map(|pos| &mut partial_state.tool_calls[pos])
        else {
            partial_state
                .pending_tool_call_idx
                .push_back(partial_state.tool_calls.len());
            partial_state.tool_calls.push(tool_call);
            continue;
        };
        // Patch the partial tool call.
        if tool_call.index.is_none() {
            // Index-less fragments repeat the id and type instead of
            // splitting them.
            tool_call.id = None;
            tool_call.r#type = None;
        }
        if let Some(id) = tool_call.id {
            partial_tool_call.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = tool_call.r#type {
            partial_tool_call.r#type.get_or_insert_default().push_str(&ty);
        }
        let Some(function) = tool_call.function else {
            continue;
        };
        match partial_tool_call.function {
            Some(ref mut partial_func) => {
                if let Some(name) = function.name {
                    partial_func.name.get_or_insert_default().push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    partial_func
                        .arguments
                        .get_or_insert_default()
                        .push_str(&arguments);
                }
            }
            None => partial_tool_call.function = Some(function),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::io::Chunks;

    async fn collect(resp: OpenAIResponse) -> Vec<ModelResponseEvent> {
        let mut resp = pin!(resp);
        let mut events = vec![];
        while let Some(event) = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap()
        {
            events.push(event);
        }
        events
    }

    fn sse_fixture(fixture: &'static [u8]) -> Sse {
        Sse::new(Chunks::from_vec_deque(
            vec![Bytes::from_static(fixture)].into(),
        ))
    }

    #[tokio::test]
    async fn test_streamed_tool_calls() {
        let sse = sse_fixture(include_bytes!("../fixtures/stream_tool_calls.txt"));
        let events = collect(OpenAIResponse::from_sse(sse)).await;

        let tool_calls: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                ModelResponseEvent::ToolCall(req) => Some(req),
                _ => None,
            })
            .collect();
        assert_eq!(tool_calls.len(), 2);
        assert_eq!(tool_calls[0].id, "call_weather");
        assert_eq!(tool_calls[0].name, "get_weather");
        assert_eq!(tool_calls[0].arguments, r#"{"city":"Paris"}"#);
        assert_eq!(tool_calls[1].name, "get_time");
        assert_eq!(tool_calls[1].arguments, r#"{"tz":"CET"}"#);
        assert_eq!(
            events.last(),
            Some(&ModelResponseEvent::Completed(ModelFinishReason::ToolCalls))
        );
    }

    #[tokio::test]
    async fn test_streamed_text() {
        let sse = sse_fixture(include_bytes!("../fixtures/stream_text.txt"));
        let events = collect(OpenAIResponse::from_sse(sse)).await;
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("Bonjour".to_owned()),
                ModelResponseEvent::MessageDelta(", ".to_owned()),
                ModelResponseEvent::MessageDelta("le monde".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_streamed_tool_calls_without_index() {
        let sse = sse_fixture(concat!(
            r#"data: {"choices":[{"index":0,"delta":{"tool_calls":[{"id":"call_1","type":"function","function":{"name":"sum","arguments":"{\"a\":"}}]}}]}"#,
            "\n\n",
            r#"data: {"choices":[{"index":0,"delta":{"tool_calls":[{"function":{"arguments":"1}"}}]}}]}"#,
            "\n\n",
            r#"data: {"choices":[{"index":0,"delta":{"tool_calls":[{"id":"call_2","type":"function","function":{"name":"mul","arguments":"{\"b\":2}"}}]}}]}"#,
            "\n\n",
            r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#,
            "\n\ndata: [DONE]\n\n",
        ).as_bytes());
        let events = collect(OpenAIResponse::from_sse(sse)).await;

        let tool_calls: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                ModelResponseEvent::ToolCall(req) => Some(req),
                _ => None,
            })
            .collect();
        assert_eq!(tool_calls.len(), 2);
        assert_eq!(tool_calls[0].id, "call_1");
        assert_eq!(tool_calls[0].name, "sum");
        assert_eq!(tool_calls[0].arguments, r#"{"a":1}"#);
        assert_eq!(tool_calls[1].id, "call_2");
        assert_eq!(tool_calls[1].name, "mul");
        assert_eq!(tool_calls[1].arguments, r#"{"b":2}"#);
    }

    #[tokio::test]
    async fn test_unknown_sse_field() {
        let sse = sse_fixture(concat!(
            "foo: bar\n",
            r#"data: {"choices":[{"index":0,"delta":{"content":"hi"},"finish_reason":"stop"}]}"#,
            "\n\ndata: [DONE]\n\n",
        ).as_bytes());
        let events = collect(OpenAIResponse::from_sse(sse)).await;
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("hi".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_without_choices() {
        let sse = sse_fixture(b"data: {\"choices\":[]}\n\ndata: [DONE]\n\n");
        let events = collect(OpenAIResponse::from_sse(sse)).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_chunk() {
        let sse = sse_fixture(b"data: {not json}\n\n");
        let mut resp = pin!(OpenAIResponse::from_sse(sse));
        let result = poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_completion_replay() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "sum", "arguments": "{\"a\":1}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();
        let events = collect(OpenAIResponse::from_completion(completion)).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            ModelResponseEvent::ToolCall(req) if req.arguments == "{\"a\":1}"
        ));

        let empty: ChatCompletion =
            serde_json::from_value(json!({ "id": "x", "choices": [] })).unwrap();
        assert!(collect(OpenAIResponse::from_completion(empty)).await.is_empty());
    }
}
