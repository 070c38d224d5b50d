use ndarray::{Array1, Array2};

/// Sentinel for anchors classified as background.
pub const MATCH_NEGATIVE: i64 = -1;
/// Sentinel for anchors excluded from the loss entirely.
pub const MATCH_IGNORE: i64 = -2;

/// Bipartite matching of ground truths to anchors over an IoU matrix of
/// shape (num_gt, num_anchors).
///
/// Each anchor is first classified by its best-gt IoU: >= `high_thres` keeps
/// the best gt index, below `low_thres` and in [low, high) become negative
/// or ignore depending on `ignore_between` (true: the between band is
/// ignored and below-low is negative; false: reversed). Then every gt's
/// best anchor is forced to match that gt; with `gt_max_first` false the
/// forcing only applies to gts no anchor was positively classified to.
/// This guarantees each gt at least one anchor regardless of thresholds.
///
/// Ties resolve to the lowest index on both argmax axes, and when two gts
/// share the same best anchor the lowest gt index wins.
///
/// Returns per-anchor match indices in {-2, -1, 0..num_gt-1} and the IoU
/// gathered at the assignment (best-gt IoU for unmatched anchors).
pub fn dual_max_match(
    overlaps: &Array2<f32>,
    high_thres: f32,
    low_thres: f32,
    ignore_between: bool,
    gt_max_first: bool,
) -> (Array1<i64>, Array1<f32>) {
    let num_gt = overlaps.nrows();
    let num_anchors = overlaps.ncols();

    // No ground truth: everything is background with zero score.
    if num_gt == 0 {
        return (
            Array1::from_elem(num_anchors, MATCH_NEGATIVE),
            Array1::zeros(num_anchors),
        );
    }

    let mut anchors_to_gt = vec![0usize; num_anchors];
    let mut match_values = vec![0f32; num_anchors];
    for a in 0..num_anchors {
        let mut best = 0usize;
        let mut best_val = overlaps[[0, a]];
        for g in 1..num_gt {
            if overlaps[[g, a]] > best_val {
                best = g;
                best_val = overlaps[[g, a]];
            }
        }
        anchors_to_gt[a] = best;
        match_values[a] = best_val;
    }

    // Tri-state classification by threshold band.
    let mut match_indices = Array1::<i64>::zeros(num_anchors);
    for a in 0..num_anchors {
        let v = match_values[a];
        let less = v < low_thres;
        let between = v >= low_thres && v < high_thres;
        let negative = if ignore_between { less } else { between };
        let ignore = if ignore_between { between } else { less };

        match_indices[a] = if negative {
            MATCH_NEGATIVE
        } else if ignore {
            MATCH_IGNORE
        } else {
            anchors_to_gt[a] as i64
        };
    }

    let mut gt_to_anchors = vec![0usize; num_gt];
    for g in 0..num_gt {
        let mut best = 0usize;
        let mut best_val = overlaps[[g, 0]];
        for a in 1..num_anchors {
            if overlaps[[g, a]] > best_val {
                best = a;
                best_val = overlaps[[g, a]];
            }
        }
        gt_to_anchors[g] = best;
    }

    // Gts that already own a positively classified anchor; only consulted
    // when gt_max_first is false.
    let mut gt_has_anchor = vec![false; num_gt];
    for a in 0..num_anchors {
        if match_indices[a] >= 0 {
            gt_has_anchor[match_indices[a] as usize] = true;
        }
    }

    let mut forced: Vec<Option<usize>> = vec![None; num_anchors];
    for g in 0..num_gt {
        if gt_max_first || !gt_has_anchor[g] {
            let a = gt_to_anchors[g];
            if forced[a].is_none() {
                forced[a] = Some(g);
            }
        }
    }

    let mut out_indices = Array1::<i64>::zeros(num_anchors);
    let mut out_scores = Array1::<f32>::zeros(num_anchors);
    for a in 0..num_anchors {
        match forced[a] {
            Some(g) => {
                out_indices[a] = g as i64;
                out_scores[a] = overlaps[[g, a]];
            }
            None => {
                out_indices[a] = match_indices[a];
                out_scores[a] = overlaps[[anchors_to_gt[a], a]];
            }
        }
    }

    (out_indices, out_scores)
}
