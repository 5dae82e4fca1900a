//! Web-search (grounding) sub-machine.
//!
//! Grounding data trickles in across chunks: the query may arrive before the
//! result list, supports may arrive last, and narrative text referencing the
//! results is interleaved throughout. This module buffers all of it and, at
//! finalize time, emits the canonical block sequence clients rely on:
//!
//! 1. `server_tool_use` announcing the search with its query
//! 2. `web_search_tool_result` carrying the full ordered result list
//! 3. one citation block per valid support record
//! 4. a single trailing text block with the buffered narrative text
//!
//! Once activated, web-search mode never deactivates for the session.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;

use crate::translator::chunk::{GroundingDelta, GroundingSupport, WebSource};
use crate::translator::frame::{Citation, ContentBlock, Delta, SearchResult, StreamFrame};

/// Accumulated grounding state for one session.
#[derive(Debug, Default, Clone)]
pub struct WebSearchState {
    pub(crate) tool_use_id: String,
    pub(crate) query: String,
    pub(crate) results: Vec<SearchResult>,
    pub(crate) supports: Vec<GroundingSupport>,
    pub(crate) buffered_text: Vec<String>,
}

impl WebSearchState {
    pub fn new(tool_use_id: String) -> Self {
        WebSearchState {
            tool_use_id,
            ..Default::default()
        }
    }

    /// Merge one chunk's grounding data into the session state.
    ///
    /// The query is first-non-empty-wins; result and support lists overwrite
    /// by presence (a chunk that omits a list leaves the previous one
    /// intact), so merged state is last-chunk-wins overall.
    pub fn merge(&mut self, delta: &GroundingDelta) {
        if self.query.is_empty() {
            if let Some(query) = delta.queries.iter().find(|q| !q.is_empty()) {
                self.query = query.clone();
            }
        }
        if let Some(sources) = &delta.sources {
            self.results = to_results(sources);
        }
        if let Some(supports) = &delta.supports {
            self.supports = supports.clone();
        }
    }

    /// Defer a narrative text part until the trailing text block.
    pub fn buffer_text(&mut self, text: &str) {
        self.buffered_text.push(text.to_string());
    }

    /// Emit the block sequence as streaming frames, advancing `block_index`
    /// past every block produced.
    pub(crate) fn emit_stream_blocks(
        &self,
        block_index: &mut usize,
        frames: &mut Vec<StreamFrame>,
    ) {
        // 1. server_tool_use with the query as an atomic input delta.
        frames.push(StreamFrame::ContentBlockStart {
            index: *block_index,
            content_block: ContentBlock::ServerToolUse {
                id: self.tool_use_id.clone(),
                name: "web_search".to_string(),
                input: json!({}),
            },
        });
        frames.push(StreamFrame::ContentBlockDelta {
            index: *block_index,
            delta: Delta::InputJsonDelta {
                partial_json: serde_json::to_string(&json!({"query": self.query}))
                    .unwrap_or_default(),
            },
        });
        frames.push(StreamFrame::ContentBlockStop {
            index: *block_index,
        });
        *block_index += 1;

        // 2. web_search_tool_result with the full result list.
        frames.push(StreamFrame::ContentBlockStart {
            index: *block_index,
            content_block: ContentBlock::WebSearchToolResult {
                tool_use_id: self.tool_use_id.clone(),
                content: self.results.clone(),
            },
        });
        frames.push(StreamFrame::ContentBlockStop {
            index: *block_index,
        });
        *block_index += 1;

        // 3. One citation block per valid support record.
        for support in &self.supports {
            let Some(citation) = build_citation(&self.results, support) else {
                continue;
            };
            frames.push(StreamFrame::ContentBlockStart {
                index: *block_index,
                content_block: ContentBlock::Text {
                    text: String::new(),
                    citations: Some(Vec::new()),
                },
            });
            frames.push(StreamFrame::ContentBlockDelta {
                index: *block_index,
                delta: Delta::CitationsDelta { citation },
            });
            frames.push(StreamFrame::ContentBlockStop {
                index: *block_index,
            });
            *block_index += 1;
        }

        // 4. Trailing text block with everything buffered during the stream.
        if !self.buffered_text.is_empty() {
            frames.push(StreamFrame::ContentBlockStart {
                index: *block_index,
                content_block: ContentBlock::text(""),
            });
            for text in self.buffered_text.iter().filter(|t| !t.is_empty()) {
                frames.push(StreamFrame::ContentBlockDelta {
                    index: *block_index,
                    delta: Delta::TextDelta { text: text.clone() },
                });
            }
            frames.push(StreamFrame::ContentBlockStop {
                index: *block_index,
            });
            *block_index += 1;
        }
    }

    /// Emit the same block sequence as document content blocks.
    pub(crate) fn document_blocks(&self) -> Vec<ContentBlock> {
        let mut blocks = vec![
            ContentBlock::ServerToolUse {
                id: self.tool_use_id.clone(),
                name: "web_search".to_string(),
                input: json!({"query": self.query}),
            },
            ContentBlock::WebSearchToolResult {
                tool_use_id: self.tool_use_id.clone(),
                content: self.results.clone(),
            },
        ];
        for support in &self.supports {
            if let Some(citation) = build_citation(&self.results, support) {
                blocks.push(ContentBlock::Text {
                    text: citation.cited_text.clone(),
                    citations: Some(vec![citation]),
                });
            }
        }
        let trailing: String = self.buffered_text.concat();
        if !trailing.is_empty() {
            blocks.push(ContentBlock::text(trailing));
        }
        blocks
    }
}

// ============================================================================
// Derivations
// ============================================================================

/// Derive the result list from parsed grounding sources. Pure and stable
/// under repeated derivation.
pub(crate) fn to_results(sources: &[WebSource]) -> Vec<SearchResult> {
    sources
        .iter()
        .map(|source| SearchResult {
            result_type: "web_search_result",
            title: source.title.clone(),
            url: source.url.clone(),
            encrypted_content: encrypted_token(&source.url, &source.title, ""),
            page_age: None,
        })
        .collect()
}

/// Build the citation for one support record. Returns `None` (silently
/// dropping the support) when the cited text is empty or the first chunk
/// index is missing or out of range.
pub(crate) fn build_citation(
    results: &[SearchResult],
    support: &GroundingSupport,
) -> Option<Citation> {
    if support.cited_text.is_empty() {
        return None;
    }
    let index = *support.chunk_indices.first()?;
    if index < 0 || index as usize >= results.len() {
        return None;
    }
    let result = &results[index as usize];
    Some(Citation {
        citation_type: "web_search_result_location",
        cited_text: support.cited_text.clone(),
        url: result.url.clone(),
        title: result.title.clone(),
        encrypted_index: encrypted_token(&result.url, &result.title, &support.cited_text),
    })
}

/// Stable opaque token derived from a result's identity (and, for citation
/// indices, the specific cited text).
fn encrypted_token(url: &str, title: &str, cited_text: &str) -> String {
    let mut payload = json!({"url": url, "title": title});
    if !cited_text.is_empty() {
        payload["cited_text"] = json!(cited_text);
    }
    BASE64.encode(payload.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str, title: &str) -> WebSource {
        WebSource {
            url: url.to_string(),
            title: title.to_string(),
        }
    }

    fn support(text: &str, indices: &[i64]) -> GroundingSupport {
        GroundingSupport {
            cited_text: text.to_string(),
            chunk_indices: indices.to_vec(),
        }
    }

    #[test]
    fn test_query_first_non_empty_wins() {
        let mut state = WebSearchState::new("srvtoolu_0".into());
        state.merge(&GroundingDelta {
            queries: vec![String::new(), "first".into()],
            ..Default::default()
        });
        state.merge(&GroundingDelta {
            queries: vec!["second".into()],
            ..Default::default()
        });
        assert_eq!(state.query, "first");
    }

    #[test]
    fn test_lists_overwrite_by_presence() {
        let mut state = WebSearchState::new("srvtoolu_0".into());
        state.merge(&GroundingDelta {
            sources: Some(vec![source("https://a.example", "A")]),
            supports: Some(vec![support("span", &[0])]),
            ..Default::default()
        });
        // A chunk without lists leaves the previous state intact.
        state.merge(&GroundingDelta::default());
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.supports.len(), 1);
        // A chunk with lists replaces them wholesale.
        state.merge(&GroundingDelta {
            sources: Some(vec![
                source("https://a.example", "A"),
                source("https://b.example", "B"),
            ]),
            ..Default::default()
        });
        assert_eq!(state.results.len(), 2);
    }

    #[test]
    fn test_encrypted_tokens_stable_and_context_sensitive() {
        let results = to_results(&[source("https://a.example", "A")]);
        let again = to_results(&[source("https://a.example", "A")]);
        assert_eq!(results, again);

        let citation = build_citation(&results, &support("cited", &[0])).unwrap();
        // The citation token incorporates the cited text, so it differs from
        // the result-level token.
        assert_ne!(citation.encrypted_index, results[0].encrypted_content);
    }

    #[test]
    fn test_invalid_supports_silently_dropped() {
        let results = to_results(&[source("https://a.example", "A")]);
        assert!(build_citation(&results, &support("", &[0])).is_none());
        assert!(build_citation(&results, &support("cited", &[])).is_none());
        assert!(build_citation(&results, &support("cited", &[1])).is_none());
        assert!(build_citation(&results, &support("cited", &[-1])).is_none());
        // Only the first index is consulted.
        assert!(build_citation(&results, &support("cited", &[5, 0])).is_none());
    }

    #[test]
    fn test_stream_block_ordering_and_indices() {
        let mut state = WebSearchState::new("srvtoolu_9".into());
        state.merge(&GroundingDelta {
            queries: vec!["rust".into()],
            sources: Some(vec![source("https://a.example", "A")]),
            supports: Some(vec![support("cited span", &[0])]),
            ..Default::default()
        });
        state.buffer_text("The answer, ");
        state.buffer_text("");
        state.buffer_text("grounded.");

        let mut index = 3;
        let mut frames = Vec::new();
        state.emit_stream_blocks(&mut index, &mut frames);

        // tool_use, tool_result, one citation, one text block.
        assert_eq!(index, 7);
        assert!(matches!(
            &frames[0],
            StreamFrame::ContentBlockStart {
                index: 3,
                content_block: ContentBlock::ServerToolUse { name, .. }
            } if name == "web_search"
        ));
        assert!(matches!(
            &frames[1],
            StreamFrame::ContentBlockDelta {
                delta: Delta::InputJsonDelta { partial_json },
                ..
            } if partial_json == "{\"query\":\"rust\"}"
        ));
        assert!(matches!(
            &frames[3],
            StreamFrame::ContentBlockStart {
                index: 4,
                content_block: ContentBlock::WebSearchToolResult { .. }
            }
        ));
        assert!(matches!(
            &frames[6],
            StreamFrame::ContentBlockDelta {
                delta: Delta::CitationsDelta { .. },
                ..
            }
        ));
        // Trailing text block carries only the non-empty buffered parts.
        let text_deltas: Vec<_> = frames
            .iter()
            .filter_map(|frame| match frame {
                StreamFrame::ContentBlockDelta {
                    index: 6,
                    delta: Delta::TextDelta { text },
                } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text_deltas, vec!["The answer, ", "grounded."]);
    }

    #[test]
    fn test_no_trailing_block_without_buffered_text() {
        let state = WebSearchState::new("srvtoolu_0".into());
        let mut index = 0;
        let mut frames = Vec::new();
        state.emit_stream_blocks(&mut index, &mut frames);
        // tool_use + tool_result only.
        assert_eq!(index, 2);
        assert!(!frames.iter().any(|frame| matches!(
            frame,
            StreamFrame::ContentBlockDelta {
                delta: Delta::TextDelta { .. },
                ..
            }
        )));
    }

    #[test]
    fn test_document_blocks_mirror_stream_ordering() {
        let mut state = WebSearchState::new("srvtoolu_1".into());
        state.merge(&GroundingDelta {
            queries: vec!["q".into()],
            sources: Some(vec![source("https://a.example", "A")]),
            supports: Some(vec![support("span", &[0]), support("bad", &[9])]),
            ..Default::default()
        });
        state.buffer_text("narrative");

        let blocks = state.document_blocks();
        assert_eq!(blocks.len(), 4);
        assert!(matches!(&blocks[0], ContentBlock::ServerToolUse { input, .. }
            if input["query"] == "q"));
        assert!(matches!(&blocks[1], ContentBlock::WebSearchToolResult { .. }));
        assert!(matches!(&blocks[2], ContentBlock::Text { citations: Some(c), .. }
            if c.len() == 1));
        assert!(matches!(&blocks[3], ContentBlock::Text { text, citations: None }
            if text == "narrative"));
    }
}
