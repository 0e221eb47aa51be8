//! Individual preprocessing steps

pub mod auto_level;
pub mod contrast;
pub mod crop;
pub mod denoise;
pub mod desaturate;
pub mod luminance;
pub mod perspective;
pub mod sharpen;
