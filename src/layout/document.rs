use serde::Serialize;
use std::time::SystemTime;

use super::cluster::Clusterer;
use super::fragment::{TextFragment, TextLine, TextParagraph};
use super::metrics::{mean_confidence, reading_seconds, word_count};

/// Raw recognition output in reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedDocument {
    /// Reading-order lines joined by newlines
    pub full_text: String,
    pub fragments: Vec<TextFragment>,
    /// Mean fragment confidence, 0.0 when there are no fragments
    pub overall_confidence: f32,
    pub captured_at: SystemTime,
}

impl RecognizedDocument {
    pub fn from_fragments(fragments: Vec<TextFragment>) -> Self {
        Self::captured(fragments, SystemTime::now(), &Clusterer::default())
    }

    /// Reading order and `full_text` follow `clusterer`'s line grouping.
    pub fn captured(
        fragments: Vec<TextFragment>,
        captured_at: SystemTime,
        clusterer: &Clusterer,
    ) -> Self {
        let lines = clusterer.group_lines(&fragments);
        let full_text = lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n");
        let fragments: Vec<TextFragment> = lines.into_iter().flat_map(TextLine::into_fragments).collect();
        let overall_confidence = mean_confidence(fragments.iter().map(|f| f.confidence));

        Self {
            full_text,
            fragments,
            overall_confidence,
            captured_at,
        }
    }

    /// Document for a capture where recognition returned nothing.
    pub fn empty() -> Self {
        Self::from_fragments(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Recognized text reconstructed into lines and paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredDocument {
    pub source: RecognizedDocument,
    pub lines: Vec<TextLine>,
    pub paragraphs: Vec<TextParagraph>,
    pub word_count: usize,
    pub estimated_reading_seconds: f32,
}

impl StructuredDocument {
    /// Derive structure by clustering the source fragments.
    pub fn from_recognized(source: RecognizedDocument) -> Self {
        Self::with_clusterer(source, &Clusterer::default())
    }

    pub fn with_clusterer(source: RecognizedDocument, clusterer: &Clusterer) -> Self {
        let layout = clusterer.structure(&source.fragments);
        let word_count = word_count(&source.full_text);
        let estimated_reading_seconds = reading_seconds(&source.full_text);

        Self {
            source,
            lines: layout.lines,
            paragraphs: layout.paragraphs,
            word_count,
            estimated_reading_seconds,
        }
    }

    pub fn from_fragments(fragments: Vec<TextFragment>) -> Self {
        Self::from_recognized(RecognizedDocument::from_fragments(fragments))
    }

    pub fn empty() -> Self {
        Self::from_recognized(RecognizedDocument::empty())
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn overall_confidence(&self) -> f32 {
        self.source.overall_confidence
    }

    /// Paragraphs separated by blank lines.
    pub fn formatted_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(TextParagraph::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
