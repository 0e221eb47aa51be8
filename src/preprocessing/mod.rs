//! Image enhancement pipeline.
//!
//! Turns a raw board photo into an OCR-ready image through a fixed sequence
//! of independently failable stages.

pub mod backend;
pub mod chain;
pub mod pipeline;
pub mod stages;
pub mod steps;

pub use backend::{Filter, FilterBackend, ImageprocBackend};
pub use chain::{ChainOutcome, FilterChain};
pub use pipeline::{Pipeline, PipelineResult, StageRecord, StageStatus};
pub use stages::{
    BoundaryStage, EnhanceStage, FnStage, RectifyMode, RectifyStage, Stage, StageContext,
    TextOptimizeStage, Weighted,
};
