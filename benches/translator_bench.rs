//! Benchmarks for the translation layer.
//!
//! Run with: cargo bench --bench translator_bench
//!
//! These benchmarks measure per-chunk streaming translation and one-shot
//! document translation.

use std::sync::Arc;

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gemini_claude_bridge::{
    NonStreamTranslator, SequentialIdGenerator, SignatureCache, StreamInput, StreamTranslator,
};
use serde_json::json;

fn translator() -> StreamTranslator {
    StreamTranslator::with_parts(
        Arc::new(SequentialIdGenerator::new()),
        Arc::new(SignatureCache::new()),
    )
}

// ============================================================================
// Streaming Benchmarks
// ============================================================================

fn bench_stream_text_chunk(c: &mut Criterion) {
    let translator = translator();
    let payload = Bytes::from(
        json!({"response": {"candidates": [{"content": {"parts": [
            {"text": "The quick brown fox jumps over the lazy dog. "}
        ]}}]}})
        .to_string(),
    );

    c.bench_function("stream_text_chunk", |b| {
        b.iter(|| {
            let mut session = translator.begin_session(b"bench");
            translator
                .translate_chunk(&mut session, StreamInput::Chunk(black_box(payload.clone())))
                .unwrap()
        })
    });
}

fn bench_stream_full_turn(c: &mut Criterion) {
    let translator = translator();
    let chunks: Vec<Bytes> = vec![
        json!({"response": {
            "candidates": [{"content": {"parts": [{"thought": true, "text": "thinking hard"}]}}],
            "responseId": "r1", "modelVersion": "gemini-3-pro"
        }}),
        json!({"response": {"candidates": [{"content": {"parts": [
            {"thought": true, "text": "", "thoughtSignature": "sig"}
        ]}}]}}),
        json!({"response": {"candidates": [{"content": {"parts": [{"text": "the answer"}]}}]}}),
        json!({"response": {"candidates": [{"content": {"parts": [
            {"functionCall": {"name": "save", "args": {"value": 42}}}
        ]}}]}}),
        json!({"response": {
            "candidates": [{"content": {"parts": []}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 30, "candidatesTokenCount": 20}
        }}),
    ]
    .into_iter()
    .map(|chunk| Bytes::from(chunk.to_string()))
    .collect();

    c.bench_function("stream_full_turn", |b| {
        b.iter(|| {
            let mut session = translator.begin_session(b"bench");
            for chunk in &chunks {
                translator
                    .translate_chunk(&mut session, StreamInput::Chunk(black_box(chunk.clone())))
                    .unwrap();
            }
            translator
                .translate_chunk(&mut session, StreamInput::Done)
                .unwrap()
        })
    });
}

// ============================================================================
// Non-Streaming Benchmarks
// ============================================================================

fn bench_one_shot_document(c: &mut Criterion) {
    let translator = NonStreamTranslator::with_ids(Arc::new(SequentialIdGenerator::new()));
    let payload = json!({"response": {
        "candidates": [{
            "content": {"parts": [
                {"thought": true, "text": "let me check the sources"},
                {"text": "Grounded answer."}
            ]},
            "groundingMetadata": {
                "webSearchQueries": ["bench query"],
                "groundingChunks": [
                    {"web": {"uri": "https://a.example", "title": "A"}},
                    {"web": {"uri": "https://b.example", "title": "B"}}
                ],
                "groundingSupports": [
                    {"segment": {"text": "Grounded"}, "groundingChunkIndices": [0]}
                ]
            },
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 50, "candidatesTokenCount": 25}
    }})
    .to_string();

    c.bench_function("one_shot_document", |b| {
        b.iter(|| translator.translate(black_box(payload.as_bytes())).unwrap())
    });
}

criterion_group!(
    benches,
    bench_stream_text_chunk,
    bench_stream_full_turn,
    bench_one_shot_document
);
criterion_main!(benches);
