//! Typed intermediate representation of one upstream chunk.
//!
//! Upstream chunks arrive as JSON documents wrapped in a `response` envelope:
//! `response.candidates[0].content.parts[]` plus optional finish reason,
//! usage metadata, and grounding data. The wire shape is parsed exactly once
//! per chunk into the types below; everything downstream pattern-matches
//! instead of probing raw JSON.
//!
//! Parsing is deliberately lenient: a missing or wrong-typed field degrades
//! to its default (empty string, zero, false) rather than failing, so one
//! malformed chunk can never abort a session. Only a payload that is not
//! JSON at all is an error, and that is reported by the caller-facing
//! translator entry points.

use serde_json::Value;

use crate::core::error::Result;

static NULL: Value = Value::Null;

/// One upstream chunk (or one complete upstream document), parsed.
#[derive(Debug, Clone, Default)]
pub struct UpstreamChunk {
    /// `response.responseId`
    pub response_id: Option<String>,
    /// `response.modelVersion`
    pub model_version: Option<String>,
    /// Classified content parts of the first candidate, in wire order.
    pub parts: Vec<ContentPart>,
    /// `response.candidates[0].finishReason`
    pub finish_reason: Option<String>,
    /// `response.usageMetadata`, when present.
    pub usage: Option<RawUsage>,
    /// `response.cpaUsageMetadata`: provisional counts used to seed the
    /// session-open frame before real usage arrives.
    pub provisional_usage: Option<RawUsage>,
    /// Grounding data, when the candidate carries any grounding key.
    pub grounding: Option<GroundingDelta>,
}

/// A single content part, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    /// Internal reasoning. The signature, when attached, is always non-empty.
    Reasoning {
        text: String,
        signature: Option<String>,
    },
    /// User-visible text.
    Text { text: String },
    /// A function/tool invocation. `args` is `None` when the call carried no
    /// argument field at all (distinct from empty arguments).
    FunctionCall { name: String, args: Option<Value> },
}

/// Raw usage counters as reported by the upstream, absent fields zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawUsage {
    pub prompt_tokens: i64,
    pub candidates_tokens: i64,
    pub thoughts_tokens: i64,
    pub total_tokens: i64,
    pub cached_tokens: i64,
}

/// Grounding data carried by one chunk.
///
/// `sources` and `supports` are `None` when the chunk did not carry the
/// corresponding list at all; the distinction drives the
/// overwrite-by-presence merge in the web-search sub-machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundingDelta {
    /// `groundingMetadata.searchEntryPoint.renderedContent` (used only by
    /// the non-streaming path).
    pub rendered_query: Option<String>,
    /// `groundingMetadata.webSearchQueries`
    pub queries: Vec<String>,
    /// Derived search sources, order-preserving.
    pub sources: Option<Vec<WebSource>>,
    /// Citation support records, order-preserving and unvalidated; index
    /// checks happen when citations are built.
    pub supports: Option<Vec<GroundingSupport>>,
}

/// One grounding chunk reduced to its addressable identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSource {
    pub url: String,
    pub title: String,
}

/// One grounding support record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundingSupport {
    /// `segment.text`: the span of narrative text this support cites.
    pub cited_text: String,
    /// `groundingChunkIndices`: references into the result list.
    pub chunk_indices: Vec<i64>,
}

impl UpstreamChunk {
    /// Parse a raw JSON payload. Fails only when the payload is not JSON.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(raw)?;
        Ok(Self::from_value(&value))
    }

    /// Extract the typed chunk from an already-parsed document.
    pub fn from_value(root: &Value) -> Self {
        let response = root.get("response").unwrap_or(&NULL);
        let candidate = response
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .unwrap_or(&NULL);

        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .map(|parts| parts.iter().filter_map(classify_part).collect())
            .unwrap_or_default();

        UpstreamChunk {
            response_id: str_field(response, "responseId"),
            model_version: str_field(response, "modelVersion"),
            parts,
            finish_reason: str_field(candidate, "finishReason"),
            usage: response.get("usageMetadata").map(parse_usage),
            provisional_usage: response.get("cpaUsageMetadata").map(parse_usage),
            grounding: parse_grounding(candidate),
        }
    }
}

// ============================================================================
// Part classification
// ============================================================================

fn classify_part(part: &Value) -> Option<ContentPart> {
    let thought = part
        .get("thought")
        .and_then(|t| t.as_bool())
        .unwrap_or(false);
    let text = part.get("text").and_then(|t| t.as_str());
    // The signature key has appeared in both spellings upstream.
    let signature = part
        .get("thoughtSignature")
        .or_else(|| part.get("thought_signature"))
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from);

    if thought && (text.is_some() || signature.is_some()) {
        return Some(ContentPart::Reasoning {
            text: text.unwrap_or_default().to_string(),
            signature,
        });
    }
    if let Some(text) = text {
        return Some(ContentPart::Text {
            text: text.to_string(),
        });
    }
    if let Some(call) = part.get("functionCall") {
        return Some(ContentPart::FunctionCall {
            name: call
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("")
                .to_string(),
            args: call.get("args").cloned(),
        });
    }
    None
}

// ============================================================================
// Usage & grounding extraction
// ============================================================================

fn parse_usage(meta: &Value) -> RawUsage {
    RawUsage {
        prompt_tokens: int_field(meta, "promptTokenCount"),
        candidates_tokens: int_field(meta, "candidatesTokenCount"),
        thoughts_tokens: int_field(meta, "thoughtsTokenCount"),
        total_tokens: int_field(meta, "totalTokenCount"),
        cached_tokens: int_field(meta, "cachedContentTokenCount"),
    }
}

fn parse_grounding(candidate: &Value) -> Option<GroundingDelta> {
    if candidate.is_null() {
        return None;
    }
    let metadata = candidate.get("groundingMetadata");
    if metadata.is_none()
        && candidate.get("groundingChunks").is_none()
        && candidate.get("groundingSupports").is_none()
    {
        return None;
    }
    let metadata = metadata.unwrap_or(&NULL);

    let queries = metadata
        .get("webSearchQueries")
        .and_then(|q| q.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|q| q.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    // Chunk/support lists can appear directly on the candidate or nested
    // under groundingMetadata depending on the backend revision.
    let chunks = candidate
        .get("groundingChunks")
        .filter(|c| c.is_array())
        .or_else(|| metadata.get("groundingChunks").filter(|c| c.is_array()));
    let supports = candidate
        .get("groundingSupports")
        .filter(|s| s.is_array())
        .or_else(|| metadata.get("groundingSupports").filter(|s| s.is_array()));

    Some(GroundingDelta {
        rendered_query: metadata
            .get("searchEntryPoint")
            .and_then(|e| e.get("renderedContent"))
            .and_then(|r| r.as_str())
            .map(String::from),
        queries,
        sources: chunks.and_then(|c| c.as_array()).map(|arr| {
            arr.iter().filter_map(parse_web_source).collect()
        }),
        supports: supports.and_then(|s| s.as_array()).map(|arr| {
            arr.iter().map(parse_support).collect()
        }),
    })
}

fn parse_web_source(chunk: &Value) -> Option<WebSource> {
    let web = chunk.get("web")?;
    let url = web
        .get("uri")
        .and_then(|u| u.as_str())
        .unwrap_or_default()
        .to_string();
    let mut title = web
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();
    if title.is_empty() {
        title = web
            .get("domain")
            .and_then(|d| d.as_str())
            .unwrap_or_default()
            .to_string();
    }
    if url.is_empty() && title.is_empty() {
        return None;
    }
    Some(WebSource { url, title })
}

fn parse_support(support: &Value) -> GroundingSupport {
    GroundingSupport {
        cited_text: support
            .get("segment")
            .and_then(|s| s.get("text"))
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string(),
        chunk_indices: support
            .get("groundingChunkIndices")
            .and_then(|i| i.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default(),
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn int_field(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(|v| v.as_i64()).unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================
