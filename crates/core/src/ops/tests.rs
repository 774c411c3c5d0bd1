use std::sync::{Arc, Mutex};

use agency_model::{
    ErrorKind as RemoteErrorKind, ModelMessage, ToolCallRequest,
};
use agency_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use serde_json::json;

use crate::{
    BoxError, ErrorKind, FuncDef, ImageToTextParams, Kind, Message,
    PromptTemplate, Provider, Role, TextToSpeechParams, TextToTextParams,
    sniff_image_mime,
};

fn tool_call(id: &str, name: &str, arguments: &str) -> PresetEvent {
    PresetEvent::ToolCall(ToolCallRequest {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments: arguments.to_owned(),
    })
}

/// A `sum` function recording the raw arguments of every call.
fn recording_sum() -> (FuncDef, Arc<Mutex<Vec<Vec<u8>>>>) {
    let calls = Arc::new(Mutex::new(vec![]));
    let func_def = {
        let calls = Arc::clone(&calls);
        FuncDef::new("sum", "Adds two numbers.", move |args: Vec<u8>| {
            calls.lock().unwrap().push(args.clone());
            async move {
                let value: serde_json::Value = serde_json::from_slice(&args)?;
                let sum = value["a"].as_i64().unwrap_or_default()
                    + value["b"].as_i64().unwrap_or_default();
                Ok::<_, BoxError>(json!({ "sum": sum }))
            }
        })
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "a": { "type": "integer" },
                "b": { "type": "integer" }
            }
        }))
    };
    (func_def, calls)
}

#[tokio::test]
async fn test_text_round_trip() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::text("Я люблю программирование."));
    let handle = model_provider.clone();

    let provider = Provider::with_model_provider(model_provider);
    let op = provider
        .text_to_text(TextToTextParams::new("gpt-4o").with_temperature(0.2))
        .with_prompt("You are a helpful assistant that translates English to Russian.");
    let input = PromptTemplate::new("Translate: {}").bind(["I love programming."]);
    let output = op.execute(Message::user(input)).await.unwrap();

    assert_eq!(output.role(), Role::Assistant);
    assert_eq!(output.kind(), Kind::Text);
    assert_eq!(output.text(), "Я люблю программирование.");

    let requests = handle.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.model.as_deref(), Some("gpt-4o"));
    assert_eq!(req.temperature, Some(0.2));
    assert!(!req.stream);
    assert!(req.tools.is_empty());
    assert_eq!(
        req.messages,
        vec![
            ModelMessage::System(
                "You are a helpful assistant that translates English to Russian."
                    .to_owned()
            ),
            ModelMessage::User("Translate: I love programming.".to_owned()),
        ]
    );
}

#[tokio::test]
async fn test_empty_prompt_is_omitted() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::text("ok"));
    let handle = model_provider.clone();

    let op = Provider::with_model_provider(model_provider)
        .text_to_text(TextToTextParams::default())
        .with_messages([Message::user("earlier"), Message::assistant("reply")]);
    op.execute(Message::user("now")).await.unwrap();

    let req = &handle.requests()[0];
    assert_eq!(req.model, None);
    assert_eq!(
        req.messages,
        vec![
            ModelMessage::User("earlier".to_owned()),
            ModelMessage::Assistant {
                content: "reply".to_owned(),
                tool_calls: vec![],
            },
            ModelMessage::User("now".to_owned()),
        ]
    );
}

#[tokio::test]
async fn test_no_tool_calls_single_round() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::text("No math needed."));
    model_provider.add_response(PresetResponse::text("unused"));
    let handle = model_provider.clone();
    let (sum, calls) = recording_sum();

    let op = Provider::with_model_provider(model_provider)
        .text_to_text(TextToTextParams::default().with_func_def(sum));
    let output = op.execute(Message::user("Hello")).await.unwrap();

    assert_eq!(output.text(), "No math needed.");
    assert_eq!(handle.requests().len(), 1);
    assert_eq!(handle.requests()[0].tools[0].name, "sum");
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_tool_call_round() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([tool_call(
        "call_1",
        "sum",
        r#"{"a": 2, "b": 3}"#,
    )]));
    model_provider.add_response(PresetResponse::text("2 + 3 = 5"));
    let handle = model_provider.clone();
    let (sum, calls) = recording_sum();

    let op = Provider::with_model_provider(model_provider)
        .text_to_text(TextToTextParams::default().with_func_def(sum));
    let output = op.execute(Message::user("What is 2 + 3?")).await.unwrap();
    assert_eq!(output.text(), "2 + 3 = 5");

    // The function sees the arguments byte for byte.
    assert_eq!(*calls.lock().unwrap(), vec![br#"{"a": 2, "b": 3}"#.to_vec()]);

    let requests = handle.requests();
    assert_eq!(requests.len(), 2);
    let messages = &requests[1].messages;
    assert_eq!(messages.len(), 3);
    assert!(matches!(
        &messages[1],
        ModelMessage::Assistant { tool_calls, .. }
            if tool_calls.len() == 1 && tool_calls[0].id == "call_1"
    ));
    let ModelMessage::Tool(result) = &messages[2] else {
        panic!("expected a tool message, got {:?}", messages[2]);
    };
    assert_eq!(result.id, "call_1");
    assert_eq!(result.name, "sum");
    assert_eq!(result.content, r#"{"sum":5}"#);
}

#[tokio::test]
async fn test_function_not_found() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([tool_call(
        "call_1", "divide", "{}",
    )]));
    model_provider.add_response(PresetResponse::text("unused"));
    let handle = model_provider.clone();
    let (sum, calls) = recording_sum();

    let op = Provider::with_model_provider(model_provider)
        .text_to_text(TextToTextParams::default().with_func_def(sum));
    let err = op.execute(Message::user("1 / 0")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FunctionNotFound);
    assert_eq!(handle.requests().len(), 1);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_function_failure_aborts() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([tool_call(
        "call_1", "lookup", "{}",
    )]));
    let handle = model_provider.clone();
    let lookup = FuncDef::new("lookup", "Looks things up.", |_| async {
        Err::<(), _>("database offline")
    });

    let op = Provider::with_model_provider(model_provider)
        .text_to_text(TextToTextParams::default().with_func_def(lookup));
    let err = op.execute(Message::user("find it")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FunctionFailed);
    assert_eq!(format!("{err}"), "call function lookup: database offline");
    assert_eq!(handle.requests().len(), 1);
}

#[tokio::test]
async fn test_no_choice() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::no_choice());

    let op = Provider::with_model_provider(model_provider)
        .text_to_text(TextToTextParams::default());
    let err = op.execute(Message::user("Hello")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoChoice);
}

#[tokio::test]
async fn test_remote_error_kind_is_kept() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::failure(RemoteErrorKind::Moderated));

    let op = Provider::with_model_provider(model_provider)
        .text_to_text(TextToTextParams::default());
    let err = op.execute(Message::user("Hello")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote(RemoteErrorKind::Moderated));
}

#[tokio::test]
async fn test_stream_deltas_in_order() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("Once ".to_owned()),
        PresetEvent::MessageDelta("upon ".to_owned()),
        PresetEvent::MessageDelta("a time".to_owned()),
    ]));
    let handle = model_provider.clone();

    let deltas = Arc::new(Mutex::new(Vec::<String>::new()));
    let op = {
        let deltas = Arc::clone(&deltas);
        Provider::with_model_provider(model_provider).text_to_stream(
            TextToTextParams::default(),
            move |delta: &str| {
                deltas.lock().unwrap().push(delta.to_owned());
                Ok::<_, BoxError>(())
            },
        )
    };
    let output = op.execute(Message::user("Tell a story")).await.unwrap();

    assert_eq!(output.text(), "Once upon a time");
    assert_eq!(*deltas.lock().unwrap(), ["Once ", "upon ", "a time"]);
    assert!(handle.requests()[0].stream);
}

#[tokio::test]
async fn test_stream_tool_call_round() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("Let me add that up.".to_owned()),
        tool_call("call_1", "sum", r#"{"a": 2, "b": 3}"#),
    ]));
    model_provider.add_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("2 + 3 ".to_owned()),
        PresetEvent::MessageDelta("= 5".to_owned()),
    ]));
    let handle = model_provider.clone();
    let (sum, calls) = recording_sum();

    let deltas = Arc::new(Mutex::new(Vec::<String>::new()));
    let op = {
        let deltas = Arc::clone(&deltas);
        Provider::with_model_provider(model_provider).text_to_stream(
            TextToTextParams::default().with_func_def(sum),
            move |delta: &str| {
                deltas.lock().unwrap().push(delta.to_owned());
                Ok::<_, BoxError>(())
            },
        )
    };
    let output = op.execute(Message::user("What is 2 + 3?")).await.unwrap();

    // Deltas of every round reach the callback, only the last round is
    // returned.
    assert_eq!(
        *deltas.lock().unwrap(),
        ["Let me add that up.", "2 + 3 ", "= 5"]
    );
    assert_eq!(output.text(), "2 + 3 = 5");
    assert_eq!(calls.lock().unwrap().len(), 1);

    let requests = handle.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|req| req.stream));
    let messages = &requests[1].messages;
    assert_eq!(messages.len(), 3);
    assert!(matches!(
        &messages[1],
        ModelMessage::Assistant { content, tool_calls }
            if content == "Let me add that up." && tool_calls.len() == 1
    ));
    let ModelMessage::Tool(result) = &messages[2] else {
        panic!("expected a tool message, got {:?}", messages[2]);
    };
    assert_eq!(result.id, "call_1");
    assert_eq!(result.content, r#"{"sum":5}"#);
}

#[tokio::test]
async fn test_stream_callback_error_aborts() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("first".to_owned()),
        PresetEvent::MessageDelta("second".to_owned()),
    ]));

    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let op = {
        let seen = Arc::clone(&seen);
        Provider::with_model_provider(model_provider).text_to_stream(
            TextToTextParams::default(),
            move |delta: &str| {
                seen.lock().unwrap().push(delta.to_owned());
                Err("client went away")
            },
        )
    };
    let err = op.execute(Message::user("Hi")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Callback);
    assert_eq!(*seen.lock().unwrap(), ["first"]);
}

#[tokio::test]
async fn test_image_to_text() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::text("A cat on a sofa."));
    let handle = model_provider.clone();

    let jpeg = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
    let op = Provider::with_model_provider(model_provider)
        .image_to_text(ImageToTextParams {
            max_tokens: Some(300),
            ..Default::default()
        })
        .with_prompt("Describe the image");
    let output = op.execute(Message::image(jpeg.clone())).await.unwrap();
    assert_eq!(output.text(), "A cat on a sofa.");

    let req = &handle.requests()[0];
    assert_eq!(req.max_tokens, Some(300));
    let [ModelMessage::UserImage { text, image }] = req.messages.as_slice() else {
        panic!("unexpected messages: {:?}", req.messages);
    };
    assert_eq!(text.as_deref(), Some("Describe the image"));
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(image.data, jpeg);

    let err = op.execute(Message::image(vec![])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_sniff_image_mime() {
    assert_eq!(sniff_image_mime(b"\x89PNG\r\n\x1a\n...."), "image/png");
    assert_eq!(sniff_image_mime(b"GIF89a...."), "image/gif");
    assert_eq!(sniff_image_mime(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
    assert_eq!(sniff_image_mime(b"unknown"), "image/png");
}

#[tokio::test]
async fn test_text_to_speech() {
    let mut model_provider = TestModelProvider::default();
    model_provider.set_audio(b"ID3audio".to_vec());
    let handle = model_provider.clone();

    let op = Provider::new(model_provider).text_to_speech(TextToSpeechParams {
        response_format: "wav".to_owned(),
        ..Default::default()
    });
    let output = op.execute(Message::user("Hello there")).await.unwrap();
    assert_eq!(output.kind(), Kind::Audio);
    assert_eq!(output.content(), b"ID3audio");

    let req = &handle.speech_requests()[0];
    assert_eq!(req.model, "tts-1");
    assert_eq!(req.voice, "alloy");
    assert_eq!(req.response_format, "wav");
    assert_eq!(req.input, "Hello there");
}

#[tokio::test]
async fn test_text_to_speech_requires_speech_provider() {
    let op = Provider::with_model_provider(TestModelProvider::default())
        .text_to_speech(TextToSpeechParams::default());
    let err = op.execute(Message::user("Hello")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_translate_then_speak() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::text("Привет"));
    model_provider.set_audio(b"audio".to_vec());
    let handle = model_provider.clone();

    let provider = Provider::new(model_provider);
    let process = provider
        .text_to_text(TextToTextParams::default())
        .with_prompt("Translate to Russian.")
        .then(provider.text_to_speech(TextToSpeechParams::default()));
    let output = process.execute(Message::user("Hello")).await.unwrap();

    assert_eq!(output.kind(), Kind::Audio);
    assert_eq!(handle.speech_requests()[0].input, "Привет");
}
