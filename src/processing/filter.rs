use log::debug;
use ndarray::{Array1, Array2};

use crate::error::errors::{Error, Result};

/// Drop detections that are too small for the source image or whose center
/// falls outside the unit square. The size floor scales with how much the
/// source image was shrunk to fit the network input:
/// `max(1e-4, min_size_ratio * sqrt(image_area / net_input_area))`.
pub fn filter_boxes(
    scores: &Array1<f32>,
    labels: &Array1<i64>,
    bboxes: &Array2<f32>,
    min_size_ratio: f32,
    image_shape: (usize, usize),
    net_input_shape: (usize, usize),
) -> Result<(Array1<f32>, Array1<i64>, Array2<f32>)> {
    if scores.len() != labels.len() || scores.len() != bboxes.nrows() {
        return Err(Error::ShapeMismatch(format!(
            "{} scores, {} labels, {} boxes",
            scores.len(),
            labels.len(),
            bboxes.nrows()
        )));
    }
    if bboxes.nrows() > 0 && bboxes.ncols() != 4 {
        return Err(Error::ShapeMismatch(format!(
            "boxes must be (N, 4), got (N, {})",
            bboxes.ncols()
        )));
    }

    let image_area = (image_shape.0 * image_shape.1) as f32;
    let net_area = (net_input_shape.0 * net_input_shape.1) as f32;
    let min_size = (min_size_ratio * (image_area / net_area).sqrt()).max(1e-4);

    let keep: Vec<usize> = (0..bboxes.nrows())
        .filter(|&i| {
            let h = bboxes[[i, 2]] - bboxes[[i, 0]];
            let w = bboxes[[i, 3]] - bboxes[[i, 1]];
            let cy = bboxes[[i, 0]] + h / 2.0;
            let cx = bboxes[[i, 1]] + w / 2.0;
            h > min_size && w > min_size && cy > 0.0 && cy < 1.0 && cx > 0.0 && cx < 1.0
        })
        .collect();
    debug!(
        "size filter kept {} of {} boxes (min_size {})",
        keep.len(),
        bboxes.nrows(),
        min_size
    );

    let out_scores = Array1::from_shape_fn(keep.len(), |i| scores[keep[i]]);
    let out_labels = Array1::from_shape_fn(keep.len(), |i| labels[keep[i]]);
    let out_boxes = Array2::from_shape_fn((keep.len(), 4), |(i, c)| bboxes[[keep[i], c]]);
    Ok((out_scores, out_labels, out_boxes))
}
