//! Property-based tests for the streaming translator.
//!
//! The upstream transport may split one logical turn across arbitrary chunk
//! boundaries. However the parts are partitioned, the client must observe
//! the same concatenated text, the same stop reason, and the same final
//! usage figures.

use std::sync::Arc;

use bytes::Bytes;
use gemini_claude_bridge::translator::frame::{Delta, StreamFrame};
use gemini_claude_bridge::{
    NonStreamTranslator, SequentialIdGenerator, SignatureCache, StreamInput, StreamTranslator,
};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Harness
// ============================================================================

struct StreamOutcome {
    text: String,
    stop_reason: String,
    usage: Value,
}

/// Deliver text pieces grouped into chunks, then the terminal usage chunk.
fn run_stream(groups: &[Vec<String>], usage: &Value) -> StreamOutcome {
    let translator = StreamTranslator::with_parts(
        Arc::new(SequentialIdGenerator::new()),
        Arc::new(SignatureCache::new()),
    );
    let mut session = translator.begin_session(b"property");
    let mut frames = Vec::new();

    for group in groups {
        let parts: Vec<Value> = group.iter().map(|text| json!({"text": text})).collect();
        frames.extend(
            translator
                .translate_chunk(
                    &mut session,
                    StreamInput::Chunk(Bytes::from(
                        json!({"response": {"candidates": [{"content": {"parts": parts}}]}})
                            .to_string(),
                    )),
                )
                .unwrap(),
        );
    }
    frames.extend(
        translator
            .translate_chunk(
                &mut session,
                StreamInput::Chunk(Bytes::from(
                    json!({"response": {
                        "candidates": [{"content": {"parts": []}, "finishReason": "STOP"}],
                        "usageMetadata": usage
                    }})
                    .to_string(),
                )),
            )
            .unwrap(),
    );

    let mut text = String::new();
    let mut stop_reason = String::new();
    let mut final_usage = Value::Null;
    for frame in &frames {
        match frame {
            StreamFrame::ContentBlockDelta {
                delta: Delta::TextDelta { text: piece },
                ..
            } => text.push_str(piece),
            StreamFrame::MessageDelta { delta, usage } => {
                stop_reason = delta.stop_reason.clone();
                final_usage = serde_json::to_value(usage).unwrap();
            }
            _ => {}
        }
    }
    StreamOutcome {
        text,
        stop_reason,
        usage: final_usage,
    }
}

/// Partition `pieces` into chunk groups using the given group sizes,
/// cycling through `sizes` until every piece is assigned.
fn partition(pieces: &[String], sizes: &[usize]) -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    let mut cursor = 0;
    let mut size_index = 0;
    while cursor < pieces.len() {
        let size = sizes[size_index % sizes.len()].max(1);
        let end = (cursor + size).min(pieces.len());
        groups.push(pieces[cursor..end].to_vec());
        cursor = end;
        size_index += 1;
    }
    groups
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn chunk_boundaries_do_not_change_the_outcome(
        pieces in prop::collection::vec("[ -~]{0,12}", 1..10),
        sizes in prop::collection::vec(1usize..4, 1..5),
        prompt in 0i64..500,
        candidates in 0i64..500,
        thoughts in 0i64..100,
        cached in 0i64..100,
    ) {
        let usage = json!({
            "promptTokenCount": prompt,
            "candidatesTokenCount": candidates,
            "thoughtsTokenCount": thoughts,
            "totalTokenCount": prompt + candidates + thoughts,
            "cachedContentTokenCount": cached
        });

        let single = run_stream(&[pieces.clone()], &usage);
        let split = run_stream(&partition(&pieces, &sizes), &usage);

        prop_assert_eq!(&single.text, &split.text);
        prop_assert_eq!(&single.stop_reason, &split.stop_reason);
        prop_assert_eq!(&single.usage, &split.usage);
    }

    #[test]
    fn streaming_and_one_shot_usage_agree(
        text in "[ -~]{1,40}",
        prompt in 0i64..500,
        candidates in 0i64..500,
        thoughts in 0i64..100,
        cached in 0i64..100,
    ) {
        let usage = json!({
            "promptTokenCount": prompt,
            "candidatesTokenCount": candidates,
            "thoughtsTokenCount": thoughts,
            "totalTokenCount": prompt + candidates + thoughts,
            "cachedContentTokenCount": cached
        });

        let streamed = run_stream(&[vec![text.clone()]], &usage);

        let doc = NonStreamTranslator::with_ids(Arc::new(SequentialIdGenerator::new()))
            .translate(
                json!({"response": {
                    "candidates": [{
                        "content": {"parts": [{"text": text}]},
                        "finishReason": "STOP"
                    }],
                    "usageMetadata": usage
                }})
                .to_string()
                .as_bytes(),
            )
            .unwrap();

        prop_assert_eq!(&streamed.stop_reason, &doc.stop_reason);
        let doc_usage = serde_json::to_value(doc.usage.expect("usage expected")).unwrap();
        prop_assert_eq!(&streamed.usage, &doc_usage);
    }
}
