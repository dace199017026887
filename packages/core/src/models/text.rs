//! Text Run Types
//!
//! Formatted text is modeled as ordered runs of codepoints sharing one set of
//! inline attributes. Structural operations (split on Enter, merge blocks)
//! move runs rather than plain strings so marks straddling the split point
//! survive the move.

use serde::{Deserialize, Serialize};

/// Inline formatting attributes for a run of text.
///
/// Each mark is tri-state:
/// - `Some(true)`: explicitly set
/// - `Some(false)`: explicitly unset
/// - `None`: no mark recorded (inherit nothing)
///
/// The explicit-unset state matters when runs are re-inserted at a position
/// whose ambient formatting differs: a stamped `Some(false)` prevents the run
/// from picking up marks active at the insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAttrs {
    /// Bold mark (the only style currently modeled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
}

impl TextAttrs {
    /// No marks recorded.
    pub fn none() -> Self {
        Self::default()
    }

    /// Bold explicitly set.
    pub fn bold() -> Self {
        Self { bold: Some(true) }
    }

    /// Whether this run renders bold.
    pub fn is_bold(&self) -> bool {
        self.bold == Some(true)
    }

    /// Stamp every mark with an explicit value, converting "no mark" into
    /// explicit unset. Used when re-inserting extracted runs.
    pub fn explicit(&self) -> Self {
        Self {
            bold: Some(self.bold.unwrap_or(false)),
        }
    }

    /// Overlay `other` on top of `self`: marks present in `other` win,
    /// absent marks leave the existing value untouched.
    pub fn apply(&self, other: &TextAttrs) -> Self {
        Self {
            bold: other.bold.or(self.bold),
        }
    }
}

/// A run of codepoints sharing one attribute set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub attrs: TextAttrs,
}

impl TextRun {
    pub fn new(text: impl Into<String>, attrs: TextAttrs) -> Self {
        Self {
            text: text.into(),
            attrs,
        }
    }

    /// Plain (unmarked) run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextAttrs::none())
    }

    /// Length in codepoints, not bytes.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_stamps_unset() {
        assert_eq!(TextAttrs::none().explicit().bold, Some(false));
        assert_eq!(TextAttrs::bold().explicit().bold, Some(true));
    }

    #[test]
    fn test_apply_overlays_present_marks() {
        let base = TextAttrs::bold();
        assert_eq!(base.apply(&TextAttrs::none()).bold, Some(true));
        assert_eq!(base.apply(&TextAttrs { bold: Some(false) }).bold, Some(false));
    }

    #[test]
    fn test_run_len_counts_codepoints() {
        let run = TextRun::plain("héllo");
        assert_eq!(run.len(), 5);
        assert_eq!(run.text.len(), 6); // bytes differ
    }
}
