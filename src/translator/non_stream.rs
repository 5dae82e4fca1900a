//! One-shot (non-streaming) translation.
//!
//! Classifies content parts exactly like the streaming path, but accumulates
//! contiguous runs of the same kind and flushes each run as a single block
//! when the kind changes (a function call flushes both pending buffers).
//! Usage and stop-reason derivation are shared with the streaming path, so
//! the two produce identical figures for an equivalent transcript.

use std::sync::Arc;

use serde_json::json;

use crate::core::error::Result;
use crate::core::id::{IdGenerator, UuidIdGenerator};
use crate::translator::chunk::{ContentPart, UpstreamChunk};
use crate::translator::frame::{ContentBlock, MessageDocument};
use crate::translator::stream::resolve_stop_reason;
use crate::translator::usage::UsageTotals;
use crate::translator::web_search::WebSearchState;

/// Translator for complete upstream documents.
pub struct NonStreamTranslator {
    ids: Arc<dyn IdGenerator>,
}

impl NonStreamTranslator {
    pub fn new() -> Self {
        Self::with_ids(Arc::new(UuidIdGenerator))
    }

    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        NonStreamTranslator { ids }
    }

    /// Translate one complete upstream document. Fails only when the payload
    /// is not JSON.
    pub fn translate(&self, raw: &[u8]) -> Result<MessageDocument> {
        let chunk = UpstreamChunk::from_slice(raw)?;
        Ok(self.build(&chunk))
    }

    fn build(&self, chunk: &UpstreamChunk) -> MessageDocument {
        let mut blocks: Vec<ContentBlock> = Vec::new();
        let mut text_buf = String::new();
        let mut thinking_buf = String::new();
        let mut thinking_sig: Option<String> = None;
        let mut tool_counter = 0usize;
        let mut has_tool = false;

        for part in &chunk.parts {
            match part {
                ContentPart::Reasoning { text, signature } => {
                    if let Some(signature) = signature {
                        thinking_sig = Some(signature.clone());
                    }
                    if !text.is_empty() {
                        flush_text(&mut blocks, &mut text_buf);
                        thinking_buf.push_str(text);
                    }
                }
                ContentPart::Text { text } => {
                    if !text.is_empty() {
                        flush_thinking(&mut blocks, &mut thinking_buf, &mut thinking_sig);
                        text_buf.push_str(text);
                    }
                }
                ContentPart::FunctionCall { name, args } => {
                    flush_thinking(&mut blocks, &mut thinking_buf, &mut thinking_sig);
                    flush_text(&mut blocks, &mut text_buf);
                    has_tool = true;
                    tool_counter += 1;
                    // Tool input is attached only when the upstream supplied
                    // a JSON object for it.
                    let input = args
                        .as_ref()
                        .filter(|value| value.is_object())
                        .cloned()
                        .unwrap_or_else(|| json!({}));
                    blocks.push(ContentBlock::ToolUse {
                        id: format!("tool_{}", tool_counter),
                        name: name.clone(),
                        input,
                    });
                }
            }
        }
        flush_thinking(&mut blocks, &mut thinking_buf, &mut thinking_sig);

        if let Some(grounding) = &chunk.grounding {
            // Grounded turns defer the narrative text to the last position,
            // after the tool-use/result/citation sequence.
            let buffered = std::mem::take(&mut text_buf);
            let mut state = WebSearchState::new(self.ids.server_tool_use_id());
            state.merge(grounding);
            if let Some(rendered) = grounding
                .rendered_query
                .as_deref()
                .filter(|rendered| !rendered.is_empty())
            {
                state.query = rendered.to_string();
            }
            if !buffered.is_empty() {
                state.buffer_text(&buffered);
            }
            blocks.extend(state.document_blocks());
        } else {
            flush_text(&mut blocks, &mut text_buf);
        }

        let totals = chunk
            .usage
            .as_ref()
            .map(UsageTotals::from_metadata)
            .unwrap_or_default();
        let payload = totals.final_payload();
        let usage = if chunk.usage.is_none()
            && payload.input_tokens == 0
            && payload.output_tokens == 0
        {
            None
        } else {
            Some(payload)
        };

        MessageDocument {
            id: chunk.response_id.clone().unwrap_or_default(),
            message_type: "message",
            role: "assistant",
            model: chunk.model_version.clone().unwrap_or_default(),
            content: (!blocks.is_empty()).then_some(blocks),
            stop_reason: resolve_stop_reason(has_tool, chunk.finish_reason.as_deref()).to_string(),
            stop_sequence: None,
            usage,
        }
    }
}

impl Default for NonStreamTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn flush_text(blocks: &mut Vec<ContentBlock>, buf: &mut String) {
    if buf.is_empty() {
        return;
    }
    blocks.push(ContentBlock::text(std::mem::take(buf)));
}

fn flush_thinking(blocks: &mut Vec<ContentBlock>, buf: &mut String, sig: &mut Option<String>) {
    if buf.is_empty() && sig.is_none() {
        return;
    }
    blocks.push(ContentBlock::Thinking {
        thinking: std::mem::take(buf),
        signature: sig.take(),
    });
}

// ============================================================================
// Tests
// ============================================================================
