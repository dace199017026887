//! Text Log Store
//!
//! Each node owns exactly one text log: an ordered sequence of codepoint
//! runs, each carrying one set of inline attributes. The log is independent
//! of tree shape; structural operations move formatted runs between logs so
//! marks straddling a split or merge point survive.
//!
//! All offsets are codepoint offsets, clamped to the current length rather
//! than erroring. Operations against a node without a log treat the log as
//! empty (logs are created lazily on first write).

use std::collections::HashMap;

use crate::models::{TextAttrs, TextRun};
use crate::store::events::{DomainEvent, EventBus};

/// Replicated text for one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLog {
    runs: Vec<TextRun>,
}

impl TextLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_runs(runs: Vec<TextRun>) -> Self {
        let mut log = Self { runs };
        log.coalesce();
        log
    }

    /// Length in codepoints.
    pub fn len(&self) -> usize {
        self.runs.iter().map(TextRun::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(TextRun::is_empty)
    }

    /// Full text without attributes.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Insert `text` at `pos` (clamped) with the given attributes.
    pub fn insert(&mut self, pos: usize, text: &str, attrs: TextAttrs) {
        if text.is_empty() {
            return;
        }
        let pos = pos.min(self.len());
        let at = self.split_at(pos);
        self.runs.insert(at, TextRun::new(text, attrs));
        self.coalesce();
    }

    /// Delete `len` codepoints starting at `pos`; both clamped.
    pub fn delete(&mut self, pos: usize, len: usize) {
        let total = self.len();
        let start = pos.min(total);
        let end = (pos + len).min(total);
        if start == end {
            return;
        }
        // Split the lower boundary first; splitting `start` after `end`
        // would shift the upper run index.
        let lo = self.split_at(start);
        let hi = self.split_at(end);
        self.runs.drain(lo..hi);
        self.coalesce();
    }

    /// Apply the marks present in `attrs` over `[pos, pos+len)`. Marks absent
    /// from `attrs` are left as they were; `Some(false)` is an explicit
    /// unset.
    pub fn format(&mut self, pos: usize, len: usize, attrs: TextAttrs) {
        let total = self.len();
        let start = pos.min(total);
        let end = (pos + len).min(total);
        if start == end {
            return;
        }
        // Lower boundary split first, same as delete.
        let lo = self.split_at(start);
        let hi = self.split_at(end);
        for run in &mut self.runs[lo..hi] {
            run.attrs = run.attrs.apply(&attrs);
        }
        self.coalesce();
    }

    /// Extract the runs covering `[pos, pos+len)` with their attributes
    /// intact, without mutating the log.
    pub fn deltas_in_range(&self, pos: usize, len: usize) -> Vec<TextRun> {
        let total = self.len();
        let start = pos.min(total);
        let end = (pos + len).min(total);
        let mut out: Vec<TextRun> = Vec::new();
        let mut offset = 0;
        for run in &self.runs {
            let run_len = run.len();
            let run_start = offset;
            let run_end = offset + run_len;
            offset = run_end;
            if run_end <= start {
                continue;
            }
            if run_start >= end {
                break;
            }
            let from = start.saturating_sub(run_start);
            let to = (end - run_start).min(run_len);
            let slice = slice_chars(&run.text, from, to);
            if !slice.is_empty() {
                out.push(TextRun::new(slice, run.attrs));
            }
        }
        out
    }

    /// Re-insert previously extracted runs at `pos`, stamping every mark
    /// with an explicit value (including explicit unset) so the runs never
    /// inherit ambient formatting at the insertion point.
    pub fn insert_runs(&mut self, pos: usize, runs: &[TextRun]) {
        let mut pos = pos.min(self.len());
        for run in runs {
            if run.is_empty() {
                continue;
            }
            self.insert(pos, &run.text, run.attrs.explicit());
            pos += run.len();
        }
    }

    /// Marks active for typing at `pos`: the attributes of the codepoint
    /// before the caret, or of the first codepoint when the caret is at the
    /// start.
    pub fn active_marks_at(&self, pos: usize) -> TextAttrs {
        if self.runs.is_empty() {
            return TextAttrs::none();
        }
        let pos = pos.min(self.len());
        let probe = pos.saturating_sub(1);
        let mut offset = 0;
        for run in &self.runs {
            let run_len = run.len();
            if probe < offset + run_len {
                return run.attrs;
            }
            offset += run_len;
        }
        self.runs.last().map(|r| r.attrs).unwrap_or_default()
    }

    /// Split the run containing `pos` so that `pos` falls on a run boundary,
    /// returning the index of the run starting at `pos`.
    fn split_at(&mut self, pos: usize) -> usize {
        let mut offset = 0;
        for i in 0..self.runs.len() {
            let run_len = self.runs[i].len();
            if pos == offset {
                return i;
            }
            if pos < offset + run_len {
                let split = pos - offset;
                let attrs = self.runs[i].attrs;
                let tail = slice_chars(&self.runs[i].text, split, run_len);
                let head = slice_chars(&self.runs[i].text, 0, split);
                self.runs[i].text = head;
                self.runs.insert(i + 1, TextRun::new(tail, attrs));
                return i + 1;
            }
            offset += run_len;
        }
        self.runs.len()
    }

    /// Merge adjacent runs with equal attributes and drop empty runs.
    fn coalesce(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(prev) if prev.attrs == run.attrs => prev.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }
}

/// Codepoint-range slice of a string.
fn slice_chars(s: &str, from: usize, to: usize) -> String {
    s.chars().skip(from).take(to.saturating_sub(from)).collect()
}

/// Maps node id to its text log and mirrors node lifecycle: logs are created
/// lazily and discarded when their node dies.
pub struct TextStore {
    logs: HashMap<String, TextLog>,
    events: EventBus,
}

impl TextStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            logs: HashMap::new(),
            events,
        }
    }

    pub fn log(&self, id: &str) -> Option<&TextLog> {
        self.logs.get(id)
    }

    pub fn text(&self, id: &str) -> String {
        self.logs.get(id).map(TextLog::text).unwrap_or_default()
    }

    pub fn len(&self, id: &str) -> usize {
        self.logs.get(id).map(TextLog::len).unwrap_or(0)
    }

    pub fn insert(&mut self, id: &str, pos: usize, text: &str, attrs: TextAttrs) {
        if text.is_empty() {
            return;
        }
        self.logs.entry(id.to_string()).or_default().insert(pos, text, attrs);
        self.changed(id);
    }

    pub fn delete(&mut self, id: &str, pos: usize, len: usize) {
        if let Some(log) = self.logs.get_mut(id) {
            log.delete(pos, len);
            self.changed(id);
        }
    }

    pub fn format(&mut self, id: &str, pos: usize, len: usize, attrs: TextAttrs) {
        if let Some(log) = self.logs.get_mut(id) {
            log.format(pos, len, attrs);
            self.changed(id);
        }
    }

    pub fn deltas_in_range(&self, id: &str, pos: usize, len: usize) -> Vec<TextRun> {
        self.logs
            .get(id)
            .map(|log| log.deltas_in_range(pos, len))
            .unwrap_or_default()
    }

    pub fn insert_runs(&mut self, id: &str, pos: usize, runs: &[TextRun]) {
        if runs.iter().all(TextRun::is_empty) {
            return;
        }
        self.logs.entry(id.to_string()).or_default().insert_runs(pos, runs);
        self.changed(id);
    }

    pub fn active_marks_at(&self, id: &str, pos: usize) -> TextAttrs {
        self.logs
            .get(id)
            .map(|log| log.active_marks_at(pos))
            .unwrap_or_default()
    }

    /// Replace a node's runs verbatim (persistence import path).
    pub fn restore(&mut self, id: &str, runs: Vec<TextRun>) {
        self.logs.insert(id.to_string(), TextLog::from_runs(runs));
    }

    /// Discard the log for a deleted node.
    pub fn remove(&mut self, id: &str) {
        self.logs.remove(id);
    }

    /// Discard the logs for a deleted subtree.
    pub fn remove_all<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for id in ids {
            self.logs.remove(id);
        }
    }

    fn changed(&self, id: &str) {
        self.events.emit(DomainEvent::TextChanged { id: id.to_string() });
    }
}
