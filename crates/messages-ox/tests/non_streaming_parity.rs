mod common;

use common::{byte_stream, chunked, response_to_sse};
use messages_ox::{
    ChatResponse, ContentBlock, MessageStream, StreamOptions, StreamUpdate,
    message::BlockKind,
};
use serde_json::{Value, json};

fn rich_document() -> Value {
    json!({
        "id": "msg_01XFDUDYJgAACzvnptvVoYEL",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-5",
        "content": [
            {
                "type": "thinking",
                "thinking": "The user wants the weather in two cities. Tokyo first, then Zürich.",
                "signature": "EqQBCgIYAhIM1gbcDa9GJwZA2b3hGgxBdjrkzLoky3dl1pkiMOYds"
            },
            {"type": "redacted_thinking", "data": "EmwKAhgBEgy3va3pzix/LafPsn4aDFIT"},
            {
                "type": "text",
                "text": "Checking both for you: 東京 first 🌤️.",
                "citations": [{
                    "type": "char_location",
                    "cited_text": "Tokyo",
                    "document_index": 0,
                    "document_title": "Cities",
                    "start_char_index": 0,
                    "end_char_index": 5
                }]
            },
            {
                "type": "server_tool_use",
                "id": "srvtoolu_01",
                "name": "web_search",
                "input": {"query": "weather Zürich today"}
            },
            {
                "type": "web_search_tool_result",
                "tool_use_id": "srvtoolu_01",
                "content": [{
                    "type": "web_search_result",
                    "title": "Zürich forecast",
                    "url": "https://example.com/zurich",
                    "encrypted_content": "EqgfCioIARgBIiQ3YTAwMjY1Mi1mZjM5",
                    "page_age": "2 hours ago"
                }]
            },
            {"type": "hologram", "frames": [1, 2, 3], "loop": true},
            {
                "type": "tool_use",
                "id": "toolu_01A09q90qw90lq917835lq9",
                "name": "GetWeather",
                "input": {"city": "Tokyo", "units": {"temp": "celsius"}, "days": [1, 2]}
            },
            {
                "type": "tool_use",
                "id": "toolu_02",
                "name": "GetTime",
                "input": {}
            }
        ],
        "stop_reason": "tool_use",
        "stop_sequence": null,
        "usage": {
            "input_tokens": 2095,
            "output_tokens": 503,
            "cache_read_input_tokens": 1200,
            "cache_creation": {"ephemeral_5m_input_tokens": 40, "ephemeral_1h_input_tokens": 0},
            "server_tool_use": {"web_search_requests": 1}
        }
    })
}

async fn stream_document(
    document: &Value,
    fragment: usize,
    chunk: usize,
) -> (ChatResponse, Vec<StreamUpdate>) {
    let body = response_to_sse(document, fragment);
    let mut stream = MessageStream::new(
        byte_stream(chunked(&body, chunk)),
        StreamOptions::default(),
    );

    let mut updates = Vec::new();
    let mut completed = None;
    while let Some(update) = stream.next_update().await.unwrap() {
        if let StreamUpdate::Completed(response) = &update {
            completed = Some(response.clone());
        }
        updates.push(update);
    }

    (completed.expect("stream should complete"), updates)
}

#[tokio::test]
async fn streamed_and_whole_documents_decode_identically() {
    let document = rich_document();
    let expected = ChatResponse::from_value(document.clone()).unwrap();

    for fragment in [1, 3, 7, 1000] {
        for chunk in [1, 5, 64, usize::MAX] {
            let (streamed, _) = stream_document(&document, fragment, chunk).await;
            assert_eq!(
                streamed, expected,
                "mismatch with fragment={fragment} chunk={chunk}"
            );
        }
    }
}

#[tokio::test]
async fn text_and_thinking_deltas_concatenate_to_final_blocks() {
    let document = rich_document();
    let (response, updates) = stream_document(&document, 2, 17).await;

    for (index, block) in response.content.iter().enumerate() {
        let text: String = updates
            .iter()
            .filter_map(|u| match u {
                StreamUpdate::TextDelta { index: i, text } if *i == index => Some(text.as_str()),
                _ => None,
            })
            .collect();
        let thinking: String = updates
            .iter()
            .filter_map(|u| match u {
                StreamUpdate::ThinkingDelta { index: i, thinking } if *i == index => {
                    Some(thinking.as_str())
                }
                _ => None,
            })
            .collect();

        match block {
            ContentBlock::Text(t) => assert_eq!(text, t.text),
            ContentBlock::Thinking(t) => assert_eq!(thinking, t.thinking),
            _ => assert!(text.is_empty() && thinking.is_empty()),
        }
    }
}

#[tokio::test]
async fn blocks_complete_in_index_order() {
    let (response, updates) = stream_document(&rich_document(), 4, 32).await;

    let completed: Vec<(usize, BlockKind)> = updates
        .iter()
        .filter_map(|u| match u {
            StreamUpdate::BlockCompleted { index, block } => Some((*index, block.kind())),
            _ => None,
        })
        .collect();

    assert_eq!(
        completed,
        [
            (0, BlockKind::Thinking),
            (1, BlockKind::RedactedThinking),
            (2, BlockKind::Text),
            (3, BlockKind::ServerToolUse),
            (4, BlockKind::WebSearchToolResult),
            (5, BlockKind::Unknown),
            (6, BlockKind::ToolUse),
            (7, BlockKind::ToolUse),
        ]
    );
    assert_eq!(response.content[5].type_name(), "hologram");
    assert_eq!(response.usage.cache_creation_tokens(), 40);
}

#[tokio::test]
async fn tool_input_survives_any_split() {
    let input = json!({"query": "a \"quoted\" {brace} and \\ slash", "n": [1.5, -2, null, true]});
    let document = json!({
        "id": "msg_split",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-5",
        "content": [{"type": "tool_use", "id": "toolu_9", "name": "Search", "input": input}],
        "stop_reason": "tool_use",
        "stop_sequence": null,
        "usage": {"input_tokens": 10, "output_tokens": 20}
    });

    let encoded_len = document["content"][0]["input"].to_string().chars().count();
    for fragment in 1..=encoded_len {
        let (response, _) = stream_document(&document, fragment, 13).await;
        assert_eq!(
            response.tool_uses().next().unwrap().input,
            input,
            "fragment size {fragment}"
        );
    }
}
