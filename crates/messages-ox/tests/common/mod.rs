#![allow(dead_code)]

use bytes::Bytes;
use futures_util::{Stream, stream};
use serde_json::{Value, json};

/// One SSE frame with a JSON payload.
pub fn frame(event: &str, data: &Value) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

/// Splits `body` into byte chunks of `size`, ignoring character boundaries.
pub fn chunked(body: &str, size: usize) -> Vec<Bytes> {
    body.as_bytes()
        .chunks(size.max(1))
        .map(Bytes::copy_from_slice)
        .collect()
}

pub fn byte_stream(
    chunks: Vec<Bytes>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    stream::iter(chunks.into_iter().map(Ok))
}

fn split_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

fn delta(index: usize, delta: Value) -> String {
    frame(
        "content_block_delta",
        &json!({"type": "content_block_delta", "index": index, "delta": delta}),
    )
}

/// Renders a complete response document as the event stream that would have
/// produced it, cutting every text, thinking and tool input into fragments of
/// `fragment` characters. Pings are interleaved between blocks.
pub fn response_to_sse(document: &Value, fragment: usize) -> String {
    let mut out = String::new();

    let mut shell = document.clone();
    shell["content"] = json!([]);
    shell["stop_reason"] = Value::Null;
    shell["stop_sequence"] = Value::Null;
    shell["usage"]["output_tokens"] = json!(1);
    out.push_str(&frame(
        "message_start",
        &json!({"type": "message_start", "message": shell}),
    ));

    let blocks = document["content"].as_array().cloned().unwrap_or_default();
    for (index, block) in blocks.iter().enumerate() {
        out.push_str(&frame("ping", &json!({"type": "ping"})));

        let kind = block["type"].as_str().unwrap_or_default();
        let (start, deltas) = match kind {
            "text" => {
                let mut deltas: Vec<Value> = block
                    .get("citations")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .map(|c| json!({"type": "citations_delta", "citation": c}))
                    .collect();
                deltas.extend(
                    split_chars(block["text"].as_str().unwrap_or_default(), fragment)
                        .into_iter()
                        .map(|t| json!({"type": "text_delta", "text": t})),
                );
                (json!({"type": "text", "text": ""}), deltas)
            }
            "thinking" => {
                let mut deltas: Vec<Value> =
                    split_chars(block["thinking"].as_str().unwrap_or_default(), fragment)
                        .into_iter()
                        .map(|t| json!({"type": "thinking_delta", "thinking": t}))
                        .collect();
                if let Some(signature) = block.get("signature") {
                    deltas.push(json!({"type": "signature_delta", "signature": signature}));
                }
                (json!({"type": "thinking", "thinking": ""}), deltas)
            }
            "tool_use" | "server_tool_use" | "mcp_tool_use" => {
                let mut start = block.clone();
                start["input"] = json!({});
                let input = block["input"].to_string();
                let deltas = if block["input"] == json!({}) {
                    Vec::new()
                } else {
                    split_chars(&input, fragment)
                        .into_iter()
                        .map(|p| json!({"type": "input_json_delta", "partial_json": p}))
                        .collect()
                };
                (start, deltas)
            }
            _ => (block.clone(), Vec::new()),
        };

        out.push_str(&frame(
            "content_block_start",
            &json!({"type": "content_block_start", "index": index, "content_block": start}),
        ));
        for d in deltas {
            out.push_str(&delta(index, d));
        }
        out.push_str(&frame(
            "content_block_stop",
            &json!({"type": "content_block_stop", "index": index}),
        ));
    }

    out.push_str(&frame(
        "message_delta",
        &json!({
            "type": "message_delta",
            "delta": {
                "stop_reason": document["stop_reason"],
                "stop_sequence": document["stop_sequence"]
            },
            "usage": {"output_tokens": document["usage"]["output_tokens"]}
        }),
    ));
    out.push_str(&frame("message_stop", &json!({"type": "message_stop"})));
    out
}

pub fn message_start(id: &str) -> String {
    frame(
        "message_start",
        &json!({
            "type": "message_start",
            "message": {
                "id": id,
                "type": "message",
                "role": "assistant",
                "content": [],
                "model": "claude-sonnet-4-5",
                "stop_reason": null,
                "stop_sequence": null,
                "usage": {"input_tokens": 25, "output_tokens": 1}
            }
        }),
    )
}

pub fn block_start(index: usize, block: &Value) -> String {
    frame(
        "content_block_start",
        &json!({"type": "content_block_start", "index": index, "content_block": block}),
    )
}

pub fn text_delta(index: usize, text: &str) -> String {
    delta(index, json!({"type": "text_delta", "text": text}))
}

pub fn json_delta(index: usize, partial_json: &str) -> String {
    delta(index, json!({"type": "input_json_delta", "partial_json": partial_json}))
}

pub fn raw_delta(index: usize, value: Value) -> String {
    delta(index, value)
}

pub fn block_stop(index: usize) -> String {
    frame(
        "content_block_stop",
        &json!({"type": "content_block_stop", "index": index}),
    )
}

pub fn message_delta(stop_reason: &str, output_tokens: u32) -> String {
    frame(
        "message_delta",
        &json!({
            "type": "message_delta",
            "delta": {"stop_reason": stop_reason, "stop_sequence": null},
            "usage": {"output_tokens": output_tokens}
        }),
    )
}

pub fn message_stop() -> String {
    frame("message_stop", &json!({"type": "message_stop"}))
}

pub fn error_event(kind: &str, message: &str) -> String {
    frame(
        "error",
        &json!({"type": "error", "error": {"type": kind, "message": message}}),
    )
}

/// Events of the canonical "Hello" response, one string per event.
pub fn hello_events() -> Vec<String> {
    vec![
        message_start("msg_hello"),
        block_start(0, &json!({"type": "text", "text": ""})),
        text_delta(0, "Hel"),
        text_delta(0, "lo"),
        block_stop(0),
        message_delta("end_turn", 15),
        message_stop(),
    ]
}

/// Events of a response that asks for `GetWeather` with `{"city":"NYC"}`.
pub fn get_weather_events() -> Vec<String> {
    vec![
        message_start("msg_weather"),
        block_start(
            0,
            &json!({"type": "tool_use", "id": "toolu_01", "name": "GetWeather", "input": {}}),
        ),
        json_delta(0, "{\"ci"),
        json_delta(0, "ty\":\"NY"),
        json_delta(0, "C\"}"),
        block_stop(0),
        message_delta("tool_use", 30),
        message_stop(),
    ]
}
