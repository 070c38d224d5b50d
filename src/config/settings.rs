use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;

/// One feature-map layer of the anchor pyramid.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerSettings {
    /// Feature map (height, width).
    pub shape: [usize; 2],
    /// Stride of this layer on the input image, in pixels.
    pub step: usize,
    /// Anchor scales, combined with every ratio.
    pub scales: Vec<f32>,
    /// Extra scales emitted as square anchors only.
    pub extra_scales: Vec<f32>,
    pub ratios: Vec<f32>,
    /// Margin (normalized) an anchor may stick out of the image and still
    /// participate in matching.
    pub allowed_border: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchSettings {
    pub positive_threshold: f32,
    pub ignore_threshold: f32,
    pub prior_scaling: [f32; 4],
}

/// Second-stage (ROI head) encoding and quota sampling parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RoiSettings {
    pub rois_per_image: usize,
    pub fg_fraction: f32,
    pub fg_threshold: f32,
    pub bg_high_threshold: f32,
    pub bg_low_threshold: f32,
    pub allowed_border: f32,
    pub head_prior_scaling: [f32; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuppressionSettings {
    pub nms_threshold: f32,
    pub keep_top_k: usize,
    /// "union" or "min".
    pub mode: String,
    pub min_size_ratio: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Input image (height, width) the strides refer to.
    pub image_shape: [usize; 2],
    /// Number of classes including background.
    pub num_classes: usize,
    pub layers: Vec<LayerSettings>,
    pub matching: MatchSettings,
    pub rois: RoiSettings,
    pub suppression: SuppressionSettings,
    pub logger: Option<Logger>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("conf/detbox.toml").format(FileFormat::Toml))
            .add_source(File::with_name(&format!("conf/{run_mode}")).required(false))
            .add_source(File::with_name("conf/local").required(false))
            .add_source(Environment::default().separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).format(FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
