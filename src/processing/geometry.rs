use ndarray::{Array1, Array2};

/// Per-box area for corner-form boxes (ymin, xmin, ymax, xmax).
/// Degenerate boxes (non-positive extent on either axis) get area 0.
pub fn areas(bboxes: &Array2<f32>) -> Array1<f32> {
    Array1::from_shape_fn(bboxes.nrows(), |i| {
        let h = (bboxes[[i, 2]] - bboxes[[i, 0]]).max(0.0);
        let w = (bboxes[[i, 3]] - bboxes[[i, 1]]).max(0.0);
        h * w
    })
}

/// Pairwise intersection volume between every box in `bboxes` and every box
/// in `query_boxes`. Output shape is (bboxes.nrows(), query_boxes.nrows());
/// non-overlapping pairs give 0, never negative.
pub fn intersection(bboxes: &Array2<f32>, query_boxes: &Array2<f32>) -> Array2<f32> {
    let n = bboxes.nrows();
    let k = query_boxes.nrows();
    let mut inter = Array2::<f32>::zeros((n, k));

    for i in 0..n {
        for j in 0..k {
            let int_ymin = bboxes[[i, 0]].max(query_boxes[[j, 0]]);
            let int_xmin = bboxes[[i, 1]].max(query_boxes[[j, 1]]);
            let int_ymax = bboxes[[i, 2]].min(query_boxes[[j, 2]]);
            let int_xmax = bboxes[[i, 3]].min(query_boxes[[j, 3]]);
            let h = (int_ymax - int_ymin).max(0.0);
            let w = (int_xmax - int_xmin).max(0.0);
            inter[[i, j]] = h * w;
        }
    }

    inter
}

/// Pairwise IoU matrix of shape (bboxes.nrows(), query_boxes.nrows()).
/// Zero intersection or zero union gives 0 rather than NaN.
pub fn iou_matrix(bboxes: &Array2<f32>, query_boxes: &Array2<f32>) -> Array2<f32> {
    let inter = intersection(bboxes, query_boxes);
    let areas_a = areas(bboxes);
    let areas_b = areas(query_boxes);

    let n = bboxes.nrows();
    let k = query_boxes.nrows();
    let mut overlaps = Array2::<f32>::zeros((n, k));

    for i in 0..n {
        for j in 0..k {
            let inter_vol = inter[[i, j]];
            let union_vol = areas_a[i] + areas_b[j] - inter_vol;
            if inter_vol > 0.0 && union_vol > 0.0 {
                overlaps[[i, j]] = inter_vol / union_vol;
            }
        }
    }

    overlaps
}

/// (center_y, center_x, height, width) -> (ymin, xmin, ymax, xmax)
pub fn center_to_corner(cy: f32, cx: f32, h: f32, w: f32) -> (f32, f32, f32, f32) {
    (cy - h / 2.0, cx - w / 2.0, cy + h / 2.0, cx + w / 2.0)
}

/// (ymin, xmin, ymax, xmax) -> (center_y, center_x, height, width)
pub fn corner_to_center(ymin: f32, xmin: f32, ymax: f32, xmax: f32) -> (f32, f32, f32, f32) {
    let h = ymax - ymin;
    let w = xmax - xmin;
    (ymin + h / 2.0, xmin + w / 2.0, h, w)
}
