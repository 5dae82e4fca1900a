//! Typed frames of the target streaming protocol.
//!
//! The translators return ordered sequences of discrete [`StreamFrame`]
//! values; callers serialize and flush them. Field names and nesting follow
//! the Claude Code streaming schema, so the serde derives below are the
//! protocol contract.

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Streaming frames
// ============================================================================

/// One ready-to-send protocol frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    MessageStart {
        message: MessageStart,
    },
    ContentBlockStart {
        index: usize,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: Delta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        delta: FinalDelta,
        usage: UsagePayload,
    },
    MessageStop,
}

impl StreamFrame {
    /// SSE event name for this frame.
    pub fn event_name(&self) -> &'static str {
        match self {
            StreamFrame::MessageStart { .. } => "message_start",
            StreamFrame::ContentBlockStart { .. } => "content_block_start",
            StreamFrame::ContentBlockDelta { .. } => "content_block_delta",
            StreamFrame::ContentBlockStop { .. } => "content_block_stop",
            StreamFrame::MessageDelta { .. } => "message_delta",
            StreamFrame::MessageStop => "message_stop",
        }
    }

    /// Render the frame as one Server-Sent Event.
    pub fn to_sse(&self) -> String {
        let data = serde_json::to_string(self).unwrap_or_else(|err| {
            tracing::warn!(frame = self.event_name(), %err, "frame serialization failed");
            String::from("{}")
        });
        format!("event: {}\ndata: {}\n\n", self.event_name(), data)
    }
}

/// Body of the session-open frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageStart {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub role: &'static str,
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
    pub usage: StartUsage,
}

impl MessageStart {
    pub fn new(id: String, model: String, input_tokens: i64, output_tokens: i64) -> Self {
        MessageStart {
            id,
            message_type: "message",
            role: "assistant",
            content: Vec::new(),
            model,
            stop_reason: None,
            stop_sequence: None,
            usage: StartUsage {
                input_tokens,
                output_tokens,
            },
        }
    }
}

/// Provisional usage carried by the session-open frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StartUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
}

/// Stop reason and sequence of the terminal frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalDelta {
    pub stop_reason: String,
    pub stop_sequence: Option<String>,
}

/// Final usage accounting, shared between the terminal streaming frame and
/// the non-streaming document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsagePayload {
    pub input_tokens: i64,
    pub output_tokens: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<i64>,
}

// ============================================================================
// Content blocks
// ============================================================================

/// Target-protocol content block types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        citations: Option<Vec<Citation>>,
    },
    Thinking {
        thinking: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ServerToolUse {
        id: String,
        name: String,
        input: Value,
    },
    WebSearchToolResult {
        tool_use_id: String,
        content: Vec<SearchResult>,
    },
}

impl ContentBlock {
    /// Plain text block without citations.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: text.into(),
            citations: None,
        }
    }

    pub fn thinking(thinking: impl Into<String>) -> Self {
        ContentBlock::Thinking {
            thinking: thinking.into(),
            signature: None,
        }
    }
}

/// In-block delta payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    SignatureDelta { signature: String },
    InputJsonDelta { partial_json: String },
    CitationsDelta { citation: Citation },
}

/// One web-search result entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub result_type: &'static str,
    pub title: String,
    pub url: String,
    pub encrypted_content: String,
    pub page_age: Option<i64>,
}

/// A citation locating cited text within a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    #[serde(rename = "type")]
    pub citation_type: &'static str,
    pub cited_text: String,
    pub url: String,
    pub title: String,
    pub encrypted_index: String,
}

// ============================================================================
// Non-streaming document
// ============================================================================

/// Complete translated message, the non-streaming counterpart of a full
/// frame sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub role: &'static str,
    pub model: String,
    /// `None` serializes as `null`: the turn produced no content at all.
    pub content: Option<Vec<ContentBlock>>,
    pub stop_reason: String,
    pub stop_sequence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsagePayload>,
}

// ============================================================================
// Tests
// ============================================================================
