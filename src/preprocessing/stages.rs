use std::sync::Arc;

use super::backend::{Filter, FilterBackend};
use super::chain::FilterChain;
use crate::detection::{BoundaryDetector, DetectionParams};
use crate::error::StageError;
use crate::geometry::Quadrilateral;
use crate::raster::Image;

/// Contrast multiplier around mid-gray (+10%)
pub const CONTRAST_FACTOR: f32 = 1.1;
/// Weight of the luminance sharpening kernel
pub const SHARPEN_STRENGTH: f32 = 0.5;
/// Deviations below this share of full scale are treated as noise
pub const DENOISE_NOISE_LEVEL: f32 = 0.02;
/// Unsharp weight applied after noise reduction
pub const DENOISE_SHARPNESS: f32 = 0.4;

/// Whether detected corners survive the boundary crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RectifyMode {
    /// Keep the four corners, translated into the cropped frame, so the
    /// rectify stage can undo perspective skew.
    #[default]
    Corners,
    /// Keep only the enclosing rectangle. Rectification then has no corners
    /// and passes the image through.
    BoundingBox,
}

impl RectifyMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "corners" => Some(Self::Corners),
            "bounding-box" | "bbox" => Some(Self::BoundingBox),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Corners => "corners",
            Self::BoundingBox => "bounding-box",
        }
    }
}

/// State threaded from stage to stage within one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct StageContext {
    /// Board corners in the coordinate frame of the current image
    pub boundary: Option<Quadrilateral>,
}

/// One step of the pipeline: takes the previous image and produces the next.
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    /// Relative share of the progress bar this stage accounts for
    fn weight(&self) -> f32 {
        1.0
    }

    fn apply(&self, image: &Image, context: &mut StageContext) -> Result<Image, StageError>;
}

/// Detects the board quadrilateral and crops to its enclosing rectangle.
pub struct BoundaryStage {
    detector: Arc<dyn BoundaryDetector>,
    backend: Arc<dyn FilterBackend>,
    params: DetectionParams,
    mode: RectifyMode,
}

impl BoundaryStage {
    pub fn new(
        detector: Arc<dyn BoundaryDetector>,
        backend: Arc<dyn FilterBackend>,
        mode: RectifyMode,
    ) -> Self {
        Self {
            detector,
            backend,
            params: DetectionParams::default(),
            mode,
        }
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }
}

impl Stage for BoundaryStage {
    fn name(&self) -> &str {
        "boundary"
    }

    fn apply(&self, image: &Image, context: &mut StageContext) -> Result<Image, StageError> {
        let quad = self
            .detector
            .detect_quadrilateral(image, &self.params)
            .ok_or(StageError::BoundaryNotFound)?;

        let rect = quad.bounding_rect();
        let (x0, y0, _, _) = rect
            .to_pixel_region(image.width(), image.height())
            .ok_or_else(|| StageError::stage(self.name(), "boundary lies outside the image"))?;

        let cropped = self.backend.apply_filter(image, &Filter::Crop { rect })?;

        context.boundary = match self.mode {
            RectifyMode::Corners => Some(quad.translate(-(x0 as f32), -(y0 as f32))),
            RectifyMode::BoundingBox => None,
        };

        Ok(cropped)
    }
}

/// Contrast, desaturation and sharpening chain for legibility.
pub struct EnhanceStage {
    chain: FilterChain,
    backend: Arc<dyn FilterBackend>,
}

impl EnhanceStage {
    pub fn new(backend: Arc<dyn FilterBackend>) -> Self {
        let chain = FilterChain::new()
            .then(Filter::AutoLevel)
            .then(Filter::Contrast {
                factor: CONTRAST_FACTOR,
            })
            .then(Filter::Desaturate)
            .then(Filter::Sharpen {
                strength: SHARPEN_STRENGTH,
            });
        Self { chain, backend }
    }

    pub fn with_chain(backend: Arc<dyn FilterBackend>, chain: FilterChain) -> Self {
        Self { chain, backend }
    }
}

impl Stage for EnhanceStage {
    fn name(&self) -> &str {
        "enhance"
    }

    fn apply(&self, image: &Image, _context: &mut StageContext) -> Result<Image, StageError> {
        run_chain(self.name(), &self.chain, self.backend.as_ref(), image)
    }
}

/// Warps the detected board onto the full image rectangle.
pub struct RectifyStage {
    backend: Arc<dyn FilterBackend>,
}

impl RectifyStage {
    pub fn new(backend: Arc<dyn FilterBackend>) -> Self {
        Self { backend }
    }
}

impl Stage for RectifyStage {
    fn name(&self) -> &str {
        "rectify"
    }

    fn apply(&self, image: &Image, context: &mut StageContext) -> Result<Image, StageError> {
        let corners = context.boundary.take().ok_or(StageError::MissingCorners)?;
        self.backend
            .apply_filter(image, &Filter::Perspective { corners })
    }
}

/// Grayscale plus light denoise: the image handed to text recognition.
pub struct TextOptimizeStage {
    chain: FilterChain,
    backend: Arc<dyn FilterBackend>,
}

impl TextOptimizeStage {
    pub fn new(backend: Arc<dyn FilterBackend>) -> Self {
        let chain = FilterChain::new().then(Filter::Luminance).then(Filter::Denoise {
            noise_level: DENOISE_NOISE_LEVEL,
            sharpness: DENOISE_SHARPNESS,
        });
        Self { chain, backend }
    }
}

impl Stage for TextOptimizeStage {
    fn name(&self) -> &str {
        "text-optimize"
    }

    fn apply(&self, image: &Image, _context: &mut StageContext) -> Result<Image, StageError> {
        run_chain(self.name(), &self.chain, self.backend.as_ref(), image)
    }
}

/// A chain stage counts as failed only if none of its filters applied.
fn run_chain(
    stage: &str,
    chain: &FilterChain,
    backend: &dyn FilterBackend,
    image: &Image,
) -> Result<Image, StageError> {
    if chain.is_empty() {
        return Ok(image.clone());
    }

    let outcome = chain.apply(backend, image);
    if outcome.applied.is_empty() {
        let reasons: Vec<String> = outcome.failed.iter().map(|(_, e)| e.to_string()).collect();
        return Err(StageError::stage(stage, reasons.join("; ")));
    }
    tracing::debug!("Stage '{}' applied filters {:?}", stage, outcome.applied);
    Ok(outcome.image)
}

/// Overrides the progress weight of another stage.
pub struct Weighted<S> {
    inner: S,
    weight: f32,
}

impl<S: Stage> Weighted<S> {
    pub fn new(inner: S, weight: f32) -> Self {
        Self { inner, weight }
    }
}

impl<S: Stage> Stage for Weighted<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn apply(&self, image: &Image, context: &mut StageContext) -> Result<Image, StageError> {
        self.inner.apply(image, context)
    }
}

type StageFn = dyn Fn(&Image) -> Result<Image, StageError> + Send + Sync;

/// Stage backed by a plain function.
pub struct FnStage {
    name: String,
    func: Box<StageFn>,
}

impl FnStage {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Image) -> Result<Image, StageError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl Stage for FnStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, image: &Image, _context: &mut StageContext) -> Result<Image, StageError> {
        (self.func)(image)
    }
}
