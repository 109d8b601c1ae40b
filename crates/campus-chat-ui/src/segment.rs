//! Splits a raw assistant answer into an optional reasoning part and the visible part.

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentedAnswer {
    /// Text between the markers, trimmed. Present only when the answer opens with [THINK_OPEN].
    pub reasoning: Option<String>,
    pub visible: String,
}

impl SegmentedAnswer {
    /// Reasoning worth showing to the user, i.e. present and not blank.
    pub fn shown_reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref().filter(|r| !r.is_empty())
    }
}

/// Reasoning is recognized only when `raw` starts with the open marker and a close marker follows
/// it. Anything else, including markers further into the text, is returned untouched as visible
/// text.
pub fn segment_response(raw: &str) -> SegmentedAnswer {
    if let Some(rest) = raw.strip_prefix(THINK_OPEN) {
        if let Some(end) = rest.find(THINK_CLOSE) {
            return SegmentedAnswer {
                reasoning: Some(rest[..end].trim().to_string()),
                visible: rest[end + THINK_CLOSE.len()..].trim().to_string(),
            };
        }
    }

    SegmentedAnswer {
        reasoning: None,
        visible: raw.trim().to_string(),
    }
}
