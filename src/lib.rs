pub mod config;
pub mod error;
pub mod logger;
pub mod processing;

pub use config::settings::Settings;
pub use error::errors::{Error, Result};
pub use processing::anchors::{AnchorCreator, LayerAnchors};
pub use processing::encoder::{AnchorEncoder, LayerEncoding, RoiEncoding};
pub use processing::filter::filter_boxes;
pub use processing::matching::{dual_max_match, MATCH_IGNORE, MATCH_NEGATIVE};
pub use processing::nms::{nms, nms_by_class, OverlapMode};
