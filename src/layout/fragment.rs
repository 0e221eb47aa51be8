//! Recognized text units and the lines and paragraphs built from them.

use serde::{Deserialize, Serialize};

use super::metrics::mean_confidence;
use crate::geometry::Rect;

/// One recognized text unit as returned by a recognition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    /// Recognition confidence in `[0, 1]`
    pub confidence: f32,
    /// Axis-aligned box in pixel coordinates
    pub bounding_box: Rect,
    pub estimated_font_size: f32,
}

impl TextFragment {
    /// Font size is estimated from the box height.
    pub fn new(text: impl Into<String>, confidence: f32, bounding_box: Rect) -> Self {
        Self {
            text: text.into(),
            confidence: super::metrics::clamp_confidence(confidence),
            estimated_font_size: bounding_box.height.max(0.0),
            bounding_box,
        }
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.estimated_font_size = size;
        self
    }

    pub fn top(&self) -> f32 {
        self.bounding_box.min_y()
    }

    pub fn left(&self) -> f32 {
        self.bounding_box.min_x()
    }
}

/// Fragments on one horizontal text line, left to right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    fragments: Vec<TextFragment>,
}

impl TextLine {
    /// Orders `fragments` by horizontal position.
    pub fn new(mut fragments: Vec<TextFragment>) -> Self {
        fragments.sort_by(|a, b| {
            a.left()
                .total_cmp(&b.left())
                .then_with(|| a.top().total_cmp(&b.top()))
                .then_with(|| a.text.cmp(&b.text))
        });
        Self { fragments }
    }

    pub fn fragments(&self) -> &[TextFragment] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<TextFragment> {
        self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Top of the left-most fragment
    pub fn top(&self) -> f32 {
        self.fragments.first().map(|f| f.top()).unwrap_or(0.0)
    }

    pub fn confidence(&self) -> f32 {
        mean_confidence(self.fragments.iter().map(|f| f.confidence))
    }

    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        enclosing(self.fragments.iter().map(|f| f.bounding_box))
    }
}

/// Lines forming one vertical text block, top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextParagraph {
    lines: Vec<TextLine>,
}

impl TextParagraph {
    pub fn new(lines: Vec<TextLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn top(&self) -> f32 {
        self.lines.first().map(|l| l.top()).unwrap_or(0.0)
    }

    /// Mean of the line confidences
    pub fn confidence(&self) -> f32 {
        mean_confidence(self.lines.iter().map(|l| l.confidence()))
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        enclosing(self.lines.iter().filter_map(|l| l.bounding_box()))
    }
}

fn enclosing(rects: impl Iterator<Item = Rect>) -> Option<Rect> {
    rects.reduce(|a, b| {
        Rect::from_corners(
            a.min_x().min(b.min_x()),
            a.min_y().min(b.min_y()),
            a.max_x().max(b.max_x()),
            a.max_y().max(b.max_y()),
        )
    })
}
