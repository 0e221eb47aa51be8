//! Spatial reconstruction of recognized text.

pub mod cluster;
pub mod document;
pub mod fragment;
pub mod metrics;

pub use cluster::{structure, Clusterer, Layout, LINE_THRESHOLD, PARAGRAPH_THRESHOLD};
pub use document::{RecognizedDocument, StructuredDocument};
pub use fragment::{TextFragment, TextLine, TextParagraph};
pub use metrics::{mean_confidence, reading_seconds, word_count, WORDS_PER_MINUTE};
