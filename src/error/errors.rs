use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Mismatched array dimensions between inputs that must line up, e.g.
    /// labels vs boxes, or head output vs anchor geometry.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Per-layer configuration lists (shapes, scales, ratios, steps,
    /// borders) must all have one entry per layer.
    #[error("inconsistent layer configuration: {0}")]
    LayerConfig(String),

    #[error("unknown overlap mode for nms: {0}")]
    UnknownOverlapMode(String),

    #[error("{0}")]
    Config(#[from] config::ConfigError),
}
