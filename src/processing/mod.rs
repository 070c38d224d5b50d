pub mod anchors;
pub mod decoder;
pub mod encoder;
pub mod filter;
pub mod geometry;
pub mod matching;
pub mod nms;
pub mod sampler;
