use serde::Serialize;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use super::backend::FilterBackend;
use super::stages::{
    BoundaryStage, EnhanceStage, RectifyMode, RectifyStage, Stage, StageContext, TextOptimizeStage,
};
use crate::detection::BoundaryDetector;
use crate::raster::Image;

/// Outcome of a single stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Applied,
    /// The stage failed and its input was passed through
    Skipped { reason: String },
}

/// Record of one stage in a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub name: String,
    #[serde(flatten)]
    pub status: StageStatus,
    pub time_ms: u64,
}

impl StageRecord {
    pub fn is_applied(&self) -> bool {
        self.status == StageStatus::Applied
    }
}

/// Result of running the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Input image, never modified (not serialized)
    #[serde(skip)]
    pub original_image: Image,
    /// Output of the last stage (not serialized)
    #[serde(skip)]
    pub enhanced_image: Image,
    /// Every stage in run order, applied or skipped
    pub stages: Vec<StageRecord>,
    pub total_time_ms: u64,
    pub timestamp: SystemTime,
}

impl PipelineResult {
    /// Names of the stages whose output was adopted, in order
    pub fn stages_applied(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.is_applied())
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn stages_skipped(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| !s.is_applied())
            .map(|s| s.name.as_str())
            .collect()
    }
}

/// Ordered list of stages run with fail-open semantics.
///
/// A failing stage never aborts the run: its input becomes its output and the
/// stage is recorded as skipped. `run` therefore always returns a usable image.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// boundary-detect-and-crop, enhance, rectify, text-optimize
    pub fn standard(
        detector: Arc<dyn BoundaryDetector>,
        backend: Arc<dyn FilterBackend>,
        mode: RectifyMode,
    ) -> Self {
        Self::new(vec![
            Box::new(BoundaryStage::new(detector, backend.clone(), mode)),
            Box::new(EnhanceStage::new(backend.clone())),
            Box::new(RectifyStage::new(backend.clone())),
            Box::new(TextOptimizeStage::new(backend)),
        ])
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run without progress reporting
    pub fn process(&self, image: Image) -> PipelineResult {
        self.run(image, |_| {})
    }

    /// Run every stage in order, calling `progress` once per completed stage
    /// with the completed fraction in `(0, 1]`.
    pub fn run<F>(&self, image: Image, mut progress: F) -> PipelineResult
    where
        F: FnMut(f32),
    {
        let start = Instant::now();
        let timestamp = SystemTime::now();
        let fractions = progress_fractions(&self.stages);

        tracing::info!(
            "Running pipeline on {}x{} image ({} stages)",
            image.width(),
            image.height(),
            self.stages.len()
        );

        let mut context = StageContext::default();
        let mut records = Vec::with_capacity(self.stages.len());
        let mut current = image.clone();

        for (stage, fraction) in self.stages.iter().zip(fractions) {
            current = self.run_stage(stage.as_ref(), current, &mut context, &mut records);
            tracing::debug!("Pipeline progress {:.2}", fraction);
            progress(fraction);
        }

        let result = PipelineResult {
            original_image: image,
            enhanced_image: current,
            stages: records,
            total_time_ms: start.elapsed().as_millis() as u64,
            timestamp,
        };

        tracing::info!(
            "Pipeline finished in {}ms: applied {:?}, skipped {:?}",
            result.total_time_ms,
            result.stages_applied(),
            result.stages_skipped()
        );

        result
    }

    fn run_stage(
        &self,
        stage: &dyn Stage,
        img: Image,
        context: &mut StageContext,
        records: &mut Vec<StageRecord>,
    ) -> Image {
        let stage_start = Instant::now();
        let (output, status) = match stage.apply(&img, context) {
            Ok(output) => (output, StageStatus::Applied),
            Err(e) => {
                tracing::warn!("Stage '{}' skipped: {}", stage.name(), e);
                (
                    img,
                    StageStatus::Skipped {
                        reason: e.to_string(),
                    },
                )
            }
        };

        records.push(StageRecord {
            name: stage.name().to_string(),
            status,
            time_ms: stage_start.elapsed().as_millis() as u64,
        });
        output
    }
}

/// Cumulative progress after each stage. Weighted by `Stage::weight`, or
/// evenly spaced when the weights do not sum to a positive number. The last
/// entry is exactly 1.0.
fn progress_fractions(stages: &[Box<dyn Stage>]) -> Vec<f32> {
    let n = stages.len();
    let weights: Vec<f32> = stages
        .iter()
        .map(|s| {
            let w = s.weight();
            if w.is_finite() && w > 0.0 {
                w
            } else {
                0.0
            }
        })
        .collect();
    let total: f32 = weights.iter().sum();

    let mut fractions = Vec::with_capacity(n);
    let mut done = 0.0_f32;
    for (i, w) in weights.iter().enumerate() {
        let fraction = if total > 0.0 {
            done += w;
            done / total
        } else {
            (i + 1) as f32 / n as f32
        };
        fractions.push(fraction.min(1.0));
    }
    if let Some(last) = fractions.last_mut() {
        *last = 1.0;
    }
    fractions
}
