//! Whiteboard and blackboard photo enhancement with OCR layout
//! reconstruction.
//!
//! A photo runs through a fail-open [`preprocessing::Pipeline`]
//! (boundary crop, enhance, rectify, text optimize), then a
//! [`engine::TextRecognizer`] turns it into positioned fragments which
//! [`layout::Clusterer`] groups into lines and paragraphs.

pub mod config;
pub mod detection;
pub mod engine;
pub mod engines;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod preprocessing;
pub mod raster;
pub mod scanner;
pub mod server;

pub use config::{Args, Config};
pub use engine::{RecognitionRequest, TextRecognizer};
pub use error::{RecognitionError, ScanError, StageError};
pub use raster::Image;
pub use scanner::{BoardScanner, ScanReport};
