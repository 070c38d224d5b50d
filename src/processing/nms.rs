use std::str::FromStr;

use log::debug;
use ndarray::{Array1, Array2};

use crate::error::errors::{Error, Result};

/// Overlap measure used to decide suppression. `Union` is classic IoU;
/// `Min` normalizes the intersection by the smaller area, so a box fully
/// contained in a larger one scores 1.0 and is always suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapMode {
    Union,
    Min,
}

impl Default for OverlapMode {
    fn default() -> Self {
        OverlapMode::Min
    }
}

impl FromStr for OverlapMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "union" => Ok(OverlapMode::Union),
            "min" => Ok(OverlapMode::Min),
            other => Err(Error::UnknownOverlapMode(other.to_string())),
        }
    }
}

fn box_area(b: &[f32; 4]) -> f32 {
    ((b[2] - b[0]).max(0.0)) * ((b[3] - b[1]).max(0.0))
}

fn pair_overlap(a: &[f32; 4], b: &[f32; 4], mode: OverlapMode) -> f32 {
    let int_ymin = a[0].max(b[0]);
    let int_xmin = a[1].max(b[1]);
    let int_ymax = a[2].min(b[2]);
    let int_xmax = a[3].min(b[3]);
    let inter = (int_ymax - int_ymin).max(0.0) * (int_xmax - int_xmin).max(0.0);
    if inter <= 0.0 {
        return 0.0;
    }

    let area_a = box_area(a);
    let area_b = box_area(b);
    let denom = match mode {
        OverlapMode::Union => area_a + area_b - inter,
        OverlapMode::Min => area_a.min(area_b),
    };
    if denom > 0.0 {
        inter / denom
    } else {
        0.0
    }
}

/// Indices sorted by descending score; equal scores keep input order.
fn sort_by_score(scores: &Array1<f32>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

fn boxes_in_order(bboxes: &Array2<f32>, order: &[usize]) -> Vec<[f32; 4]> {
    order
        .iter()
        .map(|&i| {
            [
                bboxes[[i, 0]],
                bboxes[[i, 1]],
                bboxes[[i, 2]],
                bboxes[[i, 3]],
            ]
        })
        .collect()
}

/// Greedy suppression over boxes already sorted by descending score.
/// `candidates` lists positions into `boxes` eligible for this pass; at
/// most `keep_top_k` of them are kept. Returns the kept positions.
fn suppress(
    boxes: &[[f32; 4]],
    candidates: &[usize],
    nms_threshold: f32,
    keep_top_k: usize,
    mode: OverlapMode,
) -> Vec<usize> {
    let mut alive: Vec<bool> = vec![true; candidates.len()];
    let mut kept = Vec::new();

    for round in 0..candidates.len() {
        if kept.len() >= keep_top_k {
            break;
        }
        if !alive[round] {
            continue;
        }
        let pos = candidates[round];
        kept.push(pos);
        alive[round] = false;

        for j in (round + 1)..candidates.len() {
            if alive[j]
                && pair_overlap(&boxes[pos], &boxes[candidates[j]], mode) >= nms_threshold
            {
                alive[j] = false;
            }
        }
    }

    kept
}

fn validate_detections(
    scores: &Array1<f32>,
    labels: &Array1<i64>,
    bboxes: &Array2<f32>,
) -> Result<()> {
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
    Ok(())
}

fn gather(
    scores: &Array1<f32>,
    labels: &Array1<i64>,
    bboxes: &Array2<f32>,
    indices: &[usize],
) -> (Array1<f32>, Array1<i64>, Array2<f32>) {
    let out_scores = Array1::from_shape_fn(indices.len(), |i| scores[indices[i]]);
    let out_labels = Array1::from_shape_fn(indices.len(), |i| labels[indices[i]]);
    let out_boxes = Array2::from_shape_fn((indices.len(), 4), |(i, c)| bboxes[[indices[i], c]]);
    (out_scores, out_labels, out_boxes)
}

/// Class-agnostic greedy non-maximum suppression. Detections are sorted by
/// descending score; each survivor removes every remaining box whose
/// overlap with it reaches `nms_threshold`; at most `keep_top_k` survive.
/// Empty input passes through untouched.
pub fn nms(
    scores: &Array1<f32>,
    labels: &Array1<i64>,
    bboxes: &Array2<f32>,
    nms_threshold: f32,
    keep_top_k: usize,
    mode: OverlapMode,
) -> Result<(Array1<f32>, Array1<i64>, Array2<f32>)> {
    validate_detections(scores, labels, bboxes)?;
    if scores.is_empty() {
        return Ok((scores.clone(), labels.clone(), bboxes.clone()));
    }

    let order = sort_by_score(scores);
    let boxes = boxes_in_order(bboxes, &order);
    let candidates: Vec<usize> = (0..order.len()).collect();
    let kept = suppress(&boxes, &candidates, nms_threshold, keep_top_k, mode);
    debug!("nms kept {} of {} detections", kept.len(), scores.len());

    let picked: Vec<usize> = kept.iter().map(|&p| order[p]).collect();
    Ok(gather(scores, labels, bboxes, &picked))
}

/// Per-class suppression: classes 1..num_classes are suppressed
/// independently (background class 0 is never emitted), then the union of
/// survivors is truncated to the `keep_top_k` highest-scored overall.
#[allow(clippy::too_many_arguments)]
pub fn nms_by_class(
    scores: &Array1<f32>,
    labels: &Array1<i64>,
    bboxes: &Array2<f32>,
    num_classes: i64,
    nms_threshold: f32,
    keep_top_k: usize,
    mode: OverlapMode,
) -> Result<(Array1<f32>, Array1<i64>, Array2<f32>)> {
    validate_detections(scores, labels, bboxes)?;
    if scores.is_empty() {
        return Ok((scores.clone(), labels.clone(), bboxes.clone()));
    }

    let order = sort_by_score(scores);
    let boxes = boxes_in_order(bboxes, &order);

    let mut kept_mask = vec![false; order.len()];
    for class in 1..num_classes {
        let candidates: Vec<usize> = (0..order.len())
            .filter(|&p| labels[order[p]] == class)
            .collect();
        if candidates.is_empty() {
            continue;
        }
        for pos in suppress(&boxes, &candidates, nms_threshold, keep_top_k, mode) {
            kept_mask[pos] = true;
        }
    }

    let picked: Vec<usize> = (0..order.len())
        .filter(|&p| kept_mask[p])
        .take(keep_top_k)
        .map(|p| order[p])
        .collect();
    debug!(
        "per-class nms kept {} of {} detections",
        picked.len(),
        scores.len()
    );
    Ok(gather(scores, labels, bboxes, &picked))
}
