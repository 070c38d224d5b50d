use log::debug;
use ndarray::{Array1, Array2, Array4};
use rand::Rng;

use crate::config::settings::Settings;
use crate::error::errors::{Error, Result};
use crate::processing::anchors::{AnchorCreator, LayerAnchors};
use crate::processing::geometry::{corner_to_center, iou_matrix};
use crate::processing::matching::{dual_max_match, MATCH_IGNORE};
use crate::processing::sampler::{downsample_indices, upsample_indices};

/// Training targets for one anchor layer. Labels and scores are flat over
/// (grid y, grid x, shape index); regression targets keep the grid layout
/// to match the head output tensor.
#[derive(Debug, Clone)]
pub struct LayerEncoding {
    /// (H*W*A,) gt class id where matched, 0 for background, -1 for ignore.
    pub labels: Array1<i64>,
    /// (H, W, A, 4) scaled (cy, cx, log h, log w) offsets, zero where the
    /// anchor is not positively matched.
    pub targets: Array4<f32>,
    /// (H*W*A,) IoU at the assignment.
    pub scores: Array1<f32>,
    /// (H*W*A, 4) corner-form anchor boxes.
    pub anchor_boxes: Array2<f32>,
}

/// Training targets for one image's ROI set, always exactly
/// `rois_per_image` rows.
#[derive(Debug, Clone)]
pub struct RoiEncoding {
    pub rois: Array2<f32>,
    pub targets: Array2<f32>,
    pub labels: Array1<i64>,
    pub scores: Array1<f32>,
}

/// Matches ground truth to anchor (or ROI) geometry and produces
/// classification labels plus scaled regression targets. Stateless across
/// calls; matches are recomputed fresh per encode.
#[derive(Debug, Clone)]
pub struct AnchorEncoder {
    pub(crate) anchors: Vec<LayerAnchors>,
    num_classes: usize,
    allowed_borders: Vec<f32>,
    positive_threshold: f32,
    ignore_threshold: f32,
    pub(crate) prior_scaling: [f32; 4],
    rpn_fg_thres: f32,
    rpn_bg_high_thres: f32,
    rpn_bg_low_thres: f32,
}

impl AnchorEncoder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        anchors: Vec<LayerAnchors>,
        num_classes: usize,
        allowed_borders: Vec<f32>,
        positive_threshold: f32,
        ignore_threshold: f32,
        prior_scaling: [f32; 4],
        rpn_fg_thres: f32,
        rpn_bg_high_thres: f32,
        rpn_bg_low_thres: f32,
    ) -> Result<Self> {
        if allowed_borders.len() != anchors.len() {
            return Err(Error::LayerConfig(format!(
                "{} allowed borders for {} anchor layers",
                allowed_borders.len(),
                anchors.len()
            )));
        }

        Ok(AnchorEncoder {
            anchors,
            num_classes,
            allowed_borders,
            positive_threshold,
            ignore_threshold,
            prior_scaling,
            rpn_fg_thres,
            rpn_bg_high_thres,
            rpn_bg_low_thres,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let creator = AnchorCreator::from_settings(settings)?;
        let (anchors, _) = creator.all_anchors();
        Self::new(
            anchors,
            settings.num_classes,
            settings.layers.iter().map(|l| l.allowed_border).collect(),
            settings.matching.positive_threshold,
            settings.matching.ignore_threshold,
            settings.matching.prior_scaling,
            settings.rois.fg_threshold,
            settings.rois.bg_high_threshold,
            settings.rois.bg_low_threshold,
        )
    }

    pub fn num_layers(&self) -> usize {
        self.anchors.len()
    }

    pub fn layers(&self) -> &[LayerAnchors] {
        &self.anchors
    }

    fn validate_ground_truth(labels: &Array1<i64>, bboxes: &Array2<f32>) -> Result<()> {
        if bboxes.ncols() != 4 {
            return Err(Error::ShapeMismatch(format!(
                "ground truth boxes must be (N, 4), got (N, {})",
                bboxes.ncols()
            )));
        }
        if labels.len() != bboxes.nrows() {
            return Err(Error::ShapeMismatch(format!(
                "{} labels for {} ground truth boxes",
                labels.len(),
                bboxes.nrows()
            )));
        }
        Ok(())
    }

    /// Encode ground truth against one layer's anchors.
    fn encode_anchor(
        &self,
        layer: &LayerAnchors,
        allowed_border: f32,
        labels: &Array1<i64>,
        bboxes: &Array2<f32>,
    ) -> LayerEncoding {
        let (gh, gw) = layer.grid_shape();
        let num_shapes = layer.num_anchors;
        let n = layer.len();
        let anchor_boxes = layer.corner_boxes();

        // Anchors sticking too far out of the image never match.
        let mut inside = vec![false; n];
        for (i, row) in anchor_boxes.rows().into_iter().enumerate() {
            inside[i] = row[0] >= -allowed_border
                && row[1] >= -allowed_border
                && row[2] < 1.0 + allowed_border
                && row[3] < 1.0 + allowed_border;
        }

        let mut overlaps = iou_matrix(bboxes, &anchor_boxes);
        for (j, &ok) in inside.iter().enumerate() {
            if !ok {
                overlaps.column_mut(j).fill(0.0);
            }
        }

        let (matched, scores) = dual_max_match(
            &overlaps,
            self.positive_threshold,
            self.ignore_threshold,
            true,
            true,
        );

        let ps = self.prior_scaling;
        let mut out_labels = Array1::<i64>::zeros(n);
        let mut targets = Array4::<f32>::zeros((gh, gw, num_shapes, 4));

        let mut flat = 0;
        for gy in 0..gh {
            for gx in 0..gw {
                for k in 0..num_shapes {
                    let m = matched[flat];
                    if m >= 0 {
                        let g = m as usize;
                        out_labels[flat] = labels[g];

                        let (gt_cy, gt_cx, gt_h, gt_w) = corner_to_center(
                            bboxes[[g, 0]],
                            bboxes[[g, 1]],
                            bboxes[[g, 2]],
                            bboxes[[g, 3]],
                        );
                        let yref = layer.y_centers[[gy, gx]];
                        let xref = layer.x_centers[[gy, gx]];
                        let href = layer.heights[k];
                        let wref = layer.widths[k];

                        targets[[gy, gx, k, 0]] = (gt_cy - yref) / href / ps[0];
                        targets[[gy, gx, k, 1]] = (gt_cx - xref) / wref / ps[1];
                        targets[[gy, gx, k, 2]] = (gt_h / href).ln() / ps[2];
                        targets[[gy, gx, k, 3]] = (gt_w / wref).ln() / ps[3];
                    } else if m == MATCH_IGNORE {
                        out_labels[flat] = -1;
                    }
                    flat += 1;
                }
            }
        }

        LayerEncoding {
            labels: out_labels,
            targets,
            scores,
            anchor_boxes,
        }
    }

    /// Encode one image's ground truth against every anchor layer.
    /// Returns the per-layer encodings plus the layer count.
    pub fn encode_all_anchors(
        &self,
        labels: &Array1<i64>,
        bboxes: &Array2<f32>,
    ) -> Result<(Vec<LayerEncoding>, usize)> {
        Self::validate_ground_truth(labels, bboxes)?;

        let mut encodings = Vec::with_capacity(self.anchors.len());
        for (layer_index, layer) in self.anchors.iter().enumerate() {
            let encoding =
                self.encode_anchor(layer, self.allowed_borders[layer_index], labels, bboxes);
            debug!(
                "layer {}: {} anchors, {} positive",
                layer_index,
                layer.len(),
                encoding.labels.iter().filter(|&&l| l > 0).count()
            );
            encodings.push(encoding);
        }

        Ok((encodings, self.anchors.len()))
    }

    /// Encode proposal/ROI sets for the second-stage head, one entry per
    /// image in the batch. Every image independently yields exactly
    /// `rois_per_image` sampled ROIs with targets, labels and scores.
    #[allow(clippy::too_many_arguments)]
    pub fn ext_encode_rois<R: Rng>(
        &self,
        all_rois: &[Array2<f32>],
        all_labels: &[Array1<i64>],
        all_bboxes: &[Array2<f32>],
        rois_per_image: usize,
        fg_fraction: f32,
        allowed_border: f32,
        head_prior_scaling: [f32; 4],
        rng: &mut R,
    ) -> Result<Vec<RoiEncoding>> {
        if all_rois.len() != all_labels.len() || all_rois.len() != all_bboxes.len() {
            return Err(Error::ShapeMismatch(format!(
                "batch sizes differ: {} roi sets, {} label sets, {} box sets",
                all_rois.len(),
                all_labels.len(),
                all_bboxes.len()
            )));
        }

        let expected_fg =
            ((rois_per_image as f32 * fg_fraction).round() as usize).min(rois_per_image);

        let mut out = Vec::with_capacity(all_rois.len());
        for i in 0..all_rois.len() {
            out.push(self.encode_rois_single(
                &all_rois[i],
                &all_labels[i],
                &all_bboxes[i],
                rois_per_image,
                expected_fg,
                allowed_border,
                head_prior_scaling,
                rng,
            )?);
        }
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_rois_single<R: Rng>(
        &self,
        rois: &Array2<f32>,
        labels: &Array1<i64>,
        bboxes: &Array2<f32>,
        rois_per_image: usize,
        expected_fg: usize,
        allowed_border: f32,
        head_prior_scaling: [f32; 4],
        rng: &mut R,
    ) -> Result<RoiEncoding> {
        Self::validate_ground_truth(labels, bboxes)?;
        if rois.ncols() != 4 && rois.nrows() > 0 {
            return Err(Error::ShapeMismatch(format!(
                "rois must be (N, 4), got (N, {})",
                rois.ncols()
            )));
        }

        // Positive-label ground truth joins the candidate set, so every gt
        // participates as a match target.
        let gt_rows: Vec<usize> = (0..labels.len()).filter(|&g| labels[g] > 0).collect();
        let num_gt = gt_rows.len();
        let total = rois.nrows() + num_gt;

        if total == 0 {
            return Ok(RoiEncoding {
                rois: Array2::zeros((rois_per_image, 4)),
                targets: Array2::zeros((rois_per_image, 4)),
                labels: Array1::zeros(rois_per_image),
                scores: Array1::zeros(rois_per_image),
            });
        }

        let mut gt_boxes = Array2::<f32>::zeros((num_gt, 4));
        let mut gt_labels = Array1::<i64>::zeros(num_gt);
        for (i, &g) in gt_rows.iter().enumerate() {
            for c in 0..4 {
                gt_boxes[[i, c]] = bboxes[[g, c]];
            }
            gt_labels[i] = labels[g];
        }

        let mut candidates = Array2::<f32>::zeros((total, 4));
        for r in 0..rois.nrows() {
            for c in 0..4 {
                candidates[[r, c]] = rois[[r, c]];
            }
        }
        for i in 0..num_gt {
            for c in 0..4 {
                candidates[[rois.nrows() + i, c]] = gt_boxes[[i, c]];
            }
        }

        let mut overlaps = iou_matrix(&gt_boxes, &candidates);
        for j in 0..total {
            let inside = candidates[[j, 0]] >= -allowed_border
                && candidates[[j, 1]] >= -allowed_border
                && candidates[[j, 2]] < 1.0 + allowed_border
                && candidates[[j, 3]] < 1.0 + allowed_border;
            if !inside {
                overlaps.column_mut(j).fill(0.0);
            }
        }

        let (matched, scores) = dual_max_match(
            &overlaps,
            self.rpn_fg_thres,
            self.rpn_bg_high_thres,
            true,
            true,
        );

        // The ROI itself is the regression reference frame.
        let mut out_labels = Array1::<i64>::zeros(total);
        let mut targets = Array2::<f32>::zeros((total, 4));
        for j in 0..total {
            let m = matched[j];
            if m >= 0 {
                let g = m as usize;
                out_labels[j] = gt_labels[g];

                let (yref, xref, href, wref) = corner_to_center(
                    candidates[[j, 0]],
                    candidates[[j, 1]],
                    candidates[[j, 2]],
                    candidates[[j, 3]],
                );
                let (gt_cy, gt_cx, gt_h, gt_w) = corner_to_center(
                    gt_boxes[[g, 0]],
                    gt_boxes[[g, 1]],
                    gt_boxes[[g, 2]],
                    gt_boxes[[g, 3]],
                );

                targets[[j, 0]] = (gt_cy - yref) / href / head_prior_scaling[0];
                targets[[j, 1]] = (gt_cx - xref) / wref / head_prior_scaling[1];
                targets[[j, 2]] = (gt_h / href).ln() / head_prior_scaling[2];
                targets[[j, 3]] = (gt_w / wref).ln() / head_prior_scaling[3];
            } else if m == MATCH_IGNORE {
                out_labels[j] = -1;
            }
        }

        // Foreground quota: keep all or downsample.
        let positive_indices: Vec<usize> = (0..total).filter(|&j| out_labels[j] > 0).collect();
        let n_positives = positive_indices.len();
        let fg_select: Vec<usize> = if n_positives < expected_fg {
            positive_indices.clone()
        } else {
            downsample_indices(n_positives, expected_fg, rng)
                .into_iter()
                .map(|i| positive_indices[i])
                .collect()
        };

        // Background fills whatever the foreground left of the quota.
        let negative_indices: Vec<usize> = (0..total)
            .filter(|&j| out_labels[j] == 0 && scores[j] > self.rpn_bg_low_thres)
            .collect();
        let n_negatives = negative_indices.len();
        let expected_bg = rois_per_image - n_positives.min(expected_fg);
        let bg_select: Vec<usize> = if n_negatives < expected_bg {
            negative_indices.clone()
        } else {
            downsample_indices(n_negatives, expected_bg, rng)
                .into_iter()
                .map(|i| negative_indices[i])
                .collect()
        };

        let mut keep: Vec<usize> = fg_select;
        keep.extend(bg_select);

        // No eligible candidates at all (e.g. no gt and every score zero):
        // fill the quota from the full candidate set instead.
        if keep.is_empty() {
            keep = (0..total).collect();
        }

        let final_keep: Vec<usize> = if keep.len() < rois_per_image {
            upsample_indices(keep.len(), rois_per_image, rng)
                .into_iter()
                .map(|i| keep[i])
                .collect()
        } else if keep.len() > rois_per_image {
            downsample_indices(keep.len(), rois_per_image, rng)
                .into_iter()
                .map(|i| keep[i])
                .collect()
        } else {
            keep
        };

        let mut sel_rois = Array2::<f32>::zeros((rois_per_image, 4));
        let mut sel_targets = Array2::<f32>::zeros((rois_per_image, 4));
        let mut sel_labels = Array1::<i64>::zeros(rois_per_image);
        let mut sel_scores = Array1::<f32>::zeros(rois_per_image);
        for (row, &j) in final_keep.iter().enumerate() {
            for c in 0..4 {
                sel_rois[[row, c]] = candidates[[j, c]];
                sel_targets[[row, c]] = targets[[j, c]];
            }
            sel_labels[row] = out_labels[j];
            sel_scores[row] = scores[j];
        }

        Ok(RoiEncoding {
            rois: sel_rois,
            targets: sel_targets,
            labels: sel_labels,
            scores: sel_scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use super::*;
    use crate::processing::anchors::AnchorCreator;

    fn encoder() -> AnchorEncoder {
        let creator = AnchorCreator::new(
            (300, 300),
            vec![(3, 3)],
            vec![vec![0.3]],
            vec![vec![0.4]],
            vec![vec![1.0, 2.0]],
            vec![100],
        )
        .unwrap();
        let (anchors, _) = creator.all_anchors();
        AnchorEncoder::new(
            anchors,
            21,
            vec![1.0],
            0.5,
            0.4,
            [0.1, 0.1, 0.2, 0.2],
            0.5,
            0.5,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn test_encode_all_anchors_shapes() {
        let enc = encoder();
        let labels = array![7i64];
        let bboxes = array![[0.3, 0.3, 0.7, 0.7]];
        let (encodings, num_layers) = enc.encode_all_anchors(&labels, &bboxes).unwrap();
        assert_eq!(num_layers, 1);
        let e = &encodings[0];
        assert_eq!(e.labels.len(), 3 * 3 * 3);
        assert_eq!(e.targets.dim(), (3, 3, 3, 4));
        assert_eq!(e.scores.len(), 27);
        assert_eq!(e.anchor_boxes.dim(), (27, 4));
    }

    #[test]
    fn test_every_gt_gets_an_anchor() {
        let enc = encoder();
        // a tiny gt that crosses no positive threshold anywhere
        let labels = array![3i64];
        let bboxes = array![[0.48, 0.48, 0.52, 0.52]];
        let (encodings, _) = enc.encode_all_anchors(&labels, &bboxes).unwrap();
        assert!(encodings[0].labels.iter().any(|&l| l == 3));
    }

    #[test]
    fn test_unmatched_targets_are_zero() {
        let enc = encoder();
        let labels = array![5i64];
        let bboxes = array![[0.3, 0.3, 0.7, 0.7]];
        let (encodings, _) = enc.encode_all_anchors(&labels, &bboxes).unwrap();
        let e = &encodings[0];

        let mut flat = 0;
        for gy in 0..3 {
            for gx in 0..3 {
                for k in 0..3 {
                    if e.labels[flat] <= 0 {
                        for c in 0..4 {
                            assert_relative_eq!(e.targets[[gy, gx, k, c]], 0.0);
                        }
                    }
                    flat += 1;
                }
            }
        }
    }

    #[test]
    fn test_zero_ground_truths_all_background() {
        let enc = encoder();
        let labels = Array1::<i64>::zeros(0);
        let bboxes = Array2::<f32>::zeros((0, 4));
        let (encodings, _) = enc.encode_all_anchors(&labels, &bboxes).unwrap();
        assert!(encodings[0].labels.iter().all(|&l| l == 0));
        assert!(encodings[0].scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_mismatched_labels_and_boxes_rejected() {
        let enc = encoder();
        let labels = array![1i64, 2];
        let bboxes = array![[0.3, 0.3, 0.7, 0.7]];
        assert!(enc.encode_all_anchors(&labels, &bboxes).is_err());
    }

    #[test]
    fn test_regression_target_math() {
        let enc = encoder();
        let labels = array![2i64];
        // centered on the middle grid cell so the square 0.4 anchor there
        // matches strongly
        let bboxes = array![[0.35, 0.35, 0.65, 0.65]];
        let (encodings, _) = enc.encode_all_anchors(&labels, &bboxes).unwrap();
        let e = &encodings[0];

        // middle cell (1, 1), shape 0 is the 0.4 square extra-scale anchor
        let flat = (1 * 3 + 1) * 3;
        assert_eq!(e.labels[flat], 2);

        let href = 0.4f32;
        // gt center == anchor center, so offsets are zero
        assert_relative_eq!(e.targets[[1, 1, 0, 0]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(e.targets[[1, 1, 0, 1]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(
            e.targets[[1, 1, 0, 2]],
            (0.3f32 / href).ln() / 0.2,
            epsilon = 1e-5
        );
        assert_relative_eq!(
            e.targets[[1, 1, 0, 3]],
            (0.3f32 / href).ln() / 0.2,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_ext_encode_rois_exact_quota() {
        let enc = encoder();
        // 5 proposals, 2 gts; pools are far below the quota so the combined
        // keep list is upsampled to exactly rois_per_image
        let rois = array![
            [0.30, 0.30, 0.70, 0.70],
            [0.31, 0.31, 0.71, 0.71],
            [0.10, 0.10, 0.20, 0.20],
            [0.50, 0.50, 0.90, 0.90],
            [0.05, 0.60, 0.15, 0.80]
        ];
        let labels = array![4i64, 9];
        let bboxes = array![[0.30, 0.30, 0.70, 0.70], [0.52, 0.52, 0.88, 0.88]];

        let mut rng = StdRng::seed_from_u64(3);
        let out = enc
            .ext_encode_rois(
                &[rois],
                &[labels],
                &[bboxes],
                64,
                0.25,
                1.0,
                [1.0, 1.0, 1.0, 1.0],
                &mut rng,
            )
            .unwrap();

        assert_eq!(out.len(), 1);
        let e = &out[0];
        assert_eq!(e.rois.dim(), (64, 4));
        assert_eq!(e.targets.dim(), (64, 4));
        assert_eq!(e.labels.len(), 64);
        assert_eq!(e.scores.len(), 64);
        // foreground present: the appended gt boxes match themselves
        assert!(e.labels.iter().any(|&l| l > 0));
    }

    #[test]
    fn test_ext_encode_rois_upsamples_both_pools() {
        let enc = encoder();
        // 9 strong proposals + the appended gt box give 10 foreground
        // candidates; 5 weakly overlapping boxes give 5 background
        // candidates with nonzero scores
        let mut rows = Vec::new();
        for i in 0..9 {
            let off = (i + 1) as f32 * 0.001;
            rows.push([0.3 + off, 0.3 + off, 0.7 + off, 0.7 + off]);
        }
        rows.push([0.25, 0.25, 0.35, 0.35]);
        rows.push([0.25, 0.60, 0.35, 0.72]);
        rows.push([0.62, 0.25, 0.74, 0.35]);
        rows.push([0.64, 0.64, 0.76, 0.76]);
        rows.push([0.28, 0.45, 0.34, 0.58]);
        let rois = Array2::from_shape_fn((14, 4), |(r, c)| rows[r][c]);
        let labels = array![6i64];
        let bboxes = array![[0.3, 0.3, 0.7, 0.7]];

        let mut rng = StdRng::seed_from_u64(17);
        let out = enc
            .ext_encode_rois(
                &[rois],
                &[labels],
                &[bboxes],
                64,
                0.25,
                1.0,
                [1.0, 1.0, 1.0, 1.0],
                &mut rng,
            )
            .unwrap();

        // fg target is round(64 * 0.25) = 16, but only 10 positives exist,
        // so the 15 kept candidates tile up to the full quota: 4 whole
        // copies of all 15 plus a 4-element shuffled remainder
        let e = &out[0];
        assert_eq!(e.labels.len(), 64);
        let fg = e.labels.iter().filter(|&&l| l > 0).count();
        let bg = e.labels.iter().filter(|&&l| l == 0).count();
        assert_eq!(fg + bg, 64);
        assert!((40..=44).contains(&fg));
        assert!((20..=24).contains(&bg));
    }

    #[test]
    fn test_ext_encode_rois_downsamples_excess_foreground() {
        let enc = encoder();
        // far more overlapping proposals than the fg quota of
        // round(8 * 0.25) = 2, plus enough weak boxes to fill the
        // background remainder
        let mut roi_rows = Vec::new();
        for i in 0..20 {
            let off = i as f32 * 0.001;
            roi_rows.push([0.3 + off, 0.3 + off, 0.7 + off, 0.7 + off]);
        }
        for i in 0..6 {
            let off = i as f32 * 0.02;
            roi_rows.push([0.25, 0.25 + off, 0.34, 0.34 + off]);
        }
        let rois = Array2::from_shape_fn((26, 4), |(r, c)| roi_rows[r][c]);
        let labels = array![6i64];
        let bboxes = array![[0.3, 0.3, 0.7, 0.7]];

        let mut rng = StdRng::seed_from_u64(11);
        let out = enc
            .ext_encode_rois(
                &[rois],
                &[labels],
                &[bboxes],
                8,
                0.25,
                1.0,
                [1.0, 1.0, 1.0, 1.0],
                &mut rng,
            )
            .unwrap();

        let e = &out[0];
        assert_eq!(e.labels.len(), 8);
        assert_eq!(e.labels.iter().filter(|&&l| l > 0).count(), 2);
    }

    #[test]
    fn test_ext_encode_rois_reproducible() {
        let enc = encoder();
        let rois = array![[0.3, 0.3, 0.7, 0.7], [0.1, 0.1, 0.2, 0.2]];
        let labels = array![4i64];
        let bboxes = array![[0.3, 0.3, 0.7, 0.7]];

        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            enc.ext_encode_rois(
                &[rois.clone()],
                &[labels.clone()],
                &[bboxes.clone()],
                16,
                0.25,
                1.0,
                [1.0, 1.0, 1.0, 1.0],
                &mut rng,
            )
            .unwrap()
        };

        let a = run(5);
        let b = run(5);
        assert_eq!(a[0].labels, b[0].labels);
        assert_eq!(a[0].rois, b[0].rois);
        assert_eq!(a[0].scores, b[0].scores);
    }

    #[test]
    fn test_ext_encode_rois_empty_image() {
        let enc = encoder();
        let rois = Array2::<f32>::zeros((0, 4));
        let labels = Array1::<i64>::zeros(0);
        let bboxes = Array2::<f32>::zeros((0, 4));

        let mut rng = StdRng::seed_from_u64(1);
        let out = enc
            .ext_encode_rois(
                &[rois],
                &[labels],
                &[bboxes],
                32,
                0.25,
                1.0,
                [1.0, 1.0, 1.0, 1.0],
                &mut rng,
            )
            .unwrap();

        assert_eq!(out[0].rois.dim(), (32, 4));
        assert!(out[0].labels.iter().all(|&l| l == 0));
    }
}
