//! Groups unordered text fragments into lines and paragraphs.
//!
//! Fragments are sorted top to bottom, then walked once. A fragment joins the
//! current line when its top is within [`LINE_THRESHOLD`] of the fragment
//! before it, so a line may drift vertically step by step. Lines are then
//! walked once more and merged into paragraphs when their first fragments are
//! within [`PARAGRAPH_THRESHOLD`] of each other.

use super::fragment::{TextFragment, TextLine, TextParagraph};

/// Max vertical distance between consecutive fragments of one line
pub const LINE_THRESHOLD: f32 = 20.0;
/// Max vertical distance between consecutive lines of one paragraph
pub const PARAGRAPH_THRESHOLD: f32 = 50.0;

/// Lines and paragraphs built from one fragment set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub lines: Vec<TextLine>,
    pub paragraphs: Vec<TextParagraph>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clusterer {
    line_threshold: f32,
    paragraph_threshold: f32,
}

impl Default for Clusterer {
    fn default() -> Self {
        Self {
            line_threshold: LINE_THRESHOLD,
            paragraph_threshold: PARAGRAPH_THRESHOLD,
        }
    }
}

impl Clusterer {
    pub fn new(line_threshold: f32, paragraph_threshold: f32) -> Self {
        Self {
            line_threshold,
            paragraph_threshold,
        }
    }

    /// Build lines and paragraphs. Every fragment lands in exactly one line
    /// and every line in exactly one paragraph.
    pub fn structure(&self, fragments: &[TextFragment]) -> Layout {
        let lines = self.group_lines(fragments);
        let paragraphs = self.group_paragraphs(&lines);
        Layout { lines, paragraphs }
    }

    /// Fragments in reading order: lines top to bottom, each left to right.
    pub fn reading_order(&self, fragments: &[TextFragment]) -> Vec<TextFragment> {
        self.group_lines(fragments)
            .into_iter()
            .flat_map(TextLine::into_fragments)
            .collect()
    }

    pub fn group_lines(&self, fragments: &[TextFragment]) -> Vec<TextLine> {
        let mut lines = Vec::new();
        let mut current: Vec<TextFragment> = Vec::new();

        for fragment in sort_vertical(fragments) {
            let breaks_line = match current.last() {
                Some(prev) => (fragment.top() - prev.top()).abs() >= self.line_threshold,
                None => false,
            };
            if breaks_line {
                lines.push(TextLine::new(std::mem::take(&mut current)));
            }
            current.push(fragment);
        }
        if !current.is_empty() {
            lines.push(TextLine::new(current));
        }

        lines
    }

    pub fn group_paragraphs(&self, lines: &[TextLine]) -> Vec<TextParagraph> {
        let mut paragraphs = Vec::new();
        let mut current: Vec<TextLine> = Vec::new();

        for line in lines {
            let breaks_paragraph = match current.last() {
                Some(prev) => (line.top() - prev.top()).abs() >= self.paragraph_threshold,
                None => false,
            };
            if breaks_paragraph {
                paragraphs.push(TextParagraph::new(std::mem::take(&mut current)));
            }
            current.push(line.clone());
        }
        if !current.is_empty() {
            paragraphs.push(TextParagraph::new(current));
        }

        paragraphs
    }
}

/// Sort by top edge, then left edge. Text and confidence break exact ties so
/// the result does not depend on input order.
fn sort_vertical(fragments: &[TextFragment]) -> Vec<TextFragment> {
    let mut sorted = fragments.to_vec();
    sorted.sort_by(|a, b| {
        a.top()
            .total_cmp(&b.top())
            .then_with(|| a.left().total_cmp(&b.left()))
            .then_with(|| a.text.cmp(&b.text))
            .then_with(|| a.confidence.total_cmp(&b.confidence))
    });
    sorted
}

/// Structure fragments with the default thresholds.
pub fn structure(fragments: &[TextFragment]) -> Layout {
    Clusterer::default().structure(fragments)
}
