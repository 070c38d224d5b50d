use ndarray::{Array3, Array5};

use crate::error::errors::{Error, Result};
use crate::processing::encoder::AnchorEncoder;
use crate::processing::geometry::{center_to_corner, corner_to_center};

/// Inverse of the encoding transforms: regression predictions back to
/// corner-form boxes. Boxes are not clipped to the unit square here; the
/// suppression stage filters what falls outside.
impl AnchorEncoder {
    fn decode_single(
        pred: [f32; 4],
        yref: f32,
        xref: f32,
        href: f32,
        wref: f32,
        ps: [f32; 4],
    ) -> (f32, f32, f32, f32) {
        let cy = pred[0] * ps[0] * href + yref;
        let cx = pred[1] * ps[1] * wref + xref;
        let h = (pred[2] * ps[2]).exp() * href;
        let w = (pred[3] * ps[3]).exp() * wref;
        center_to_corner(cy, cx, h, w)
    }

    /// Decode per-layer head predictions of shape (B, H, W, A, 4) into
    /// corner-form boxes with the same layout.
    pub fn decode_all_anchors(&self, pred: &[Array5<f32>]) -> Result<Vec<Array5<f32>>> {
        if pred.len() != self.anchors.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} prediction layers for {} anchor layers",
                pred.len(),
                self.anchors.len()
            )));
        }

        let ps = self.prior_scaling;
        let mut decoded = Vec::with_capacity(pred.len());
        for (layer_index, layer_pred) in pred.iter().enumerate() {
            let layer = &self.anchors[layer_index];
            let (gh, gw) = layer.grid_shape();
            let (b, ph, pw, pa, pc) = layer_pred.dim();
            if ph != gh || pw != gw || pa != layer.num_anchors || pc != 4 {
                return Err(Error::ShapeMismatch(format!(
                    "layer {} predictions are ({}, {}, {}, {}), anchors are ({}, {}, {}, 4)",
                    layer_index, ph, pw, pa, pc, gh, gw, layer.num_anchors
                )));
            }

            let mut out = Array5::<f32>::zeros((b, gh, gw, layer.num_anchors, 4));
            for n in 0..b {
                for gy in 0..gh {
                    for gx in 0..gw {
                        let yref = layer.y_centers[[gy, gx]];
                        let xref = layer.x_centers[[gy, gx]];
                        for k in 0..layer.num_anchors {
                            let p = [
                                layer_pred[[n, gy, gx, k, 0]],
                                layer_pred[[n, gy, gx, k, 1]],
                                layer_pred[[n, gy, gx, k, 2]],
                                layer_pred[[n, gy, gx, k, 3]],
                            ];
                            let (ymin, xmin, ymax, xmax) = Self::decode_single(
                                p,
                                yref,
                                xref,
                                layer.heights[k],
                                layer.widths[k],
                                ps,
                            );
                            out[[n, gy, gx, k, 0]] = ymin;
                            out[[n, gy, gx, k, 1]] = xmin;
                            out[[n, gy, gx, k, 2]] = ymax;
                            out[[n, gy, gx, k, 3]] = xmax;
                        }
                    }
                }
            }
            decoded.push(out);
        }

        Ok(decoded)
    }

    /// Same decode but with the grid flattened per layer: predictions come
    /// in as (B, H*W*A, 4), row-major over (grid y, grid x, shape index),
    /// matching the layout of [`LayerAnchors::corner_boxes`].
    pub fn decode_all_anchors_flat(&self, pred: &[Array3<f32>]) -> Result<Vec<Array3<f32>>> {
        if pred.len() != self.anchors.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} prediction layers for {} anchor layers",
                pred.len(),
                self.anchors.len()
            )));
        }

        let ps = self.prior_scaling;
        let mut decoded = Vec::with_capacity(pred.len());
        for (layer_index, layer_pred) in pred.iter().enumerate() {
            let layer = &self.anchors[layer_index];
            let (gh, gw) = layer.grid_shape();
            let (b, pn, pc) = layer_pred.dim();
            if pn != layer.len() || pc != 4 {
                return Err(Error::ShapeMismatch(format!(
                    "layer {} predictions are ({}, {}), expected ({}, 4)",
                    layer_index,
                    pn,
                    pc,
                    layer.len()
                )));
            }

            let mut out = Array3::<f32>::zeros((b, pn, 4));
            for n in 0..b {
                let mut flat = 0;
                for gy in 0..gh {
                    for gx in 0..gw {
                        let yref = layer.y_centers[[gy, gx]];
                        let xref = layer.x_centers[[gy, gx]];
                        for k in 0..layer.num_anchors {
                            let p = [
                                layer_pred[[n, flat, 0]],
                                layer_pred[[n, flat, 1]],
                                layer_pred[[n, flat, 2]],
                                layer_pred[[n, flat, 3]],
                            ];
                            let (ymin, xmin, ymax, xmax) = Self::decode_single(
                                p,
                                yref,
                                xref,
                                layer.heights[k],
                                layer.widths[k],
                                ps,
                            );
                            out[[n, flat, 0]] = ymin;
                            out[[n, flat, 1]] = xmin;
                            out[[n, flat, 2]] = ymax;
                            out[[n, flat, 3]] = xmax;
                            flat += 1;
                        }
                    }
                }
            }
            decoded.push(out);
        }

        Ok(decoded)
    }

    /// Decode second-stage head predictions against their own proposals:
    /// each proposal's center form is the reference frame, the same one
    /// used when its targets were encoded. Shapes are (B, N, 4).
    pub fn ext_decode_rois(
        &self,
        proposals: &Array3<f32>,
        pred: &Array3<f32>,
        head_prior_scaling: [f32; 4],
    ) -> Result<Array3<f32>> {
        if proposals.dim() != pred.dim() {
            return Err(Error::ShapeMismatch(format!(
                "proposals are {:?}, predictions are {:?}",
                proposals.dim(),
                pred.dim()
            )));
        }
        let (b, n, c) = proposals.dim();
        if c != 4 {
            return Err(Error::ShapeMismatch(format!(
                "proposals must be (B, N, 4), got (B, N, {})",
                c
            )));
        }

        let mut out = Array3::<f32>::zeros((b, n, 4));
        for i in 0..b {
            for j in 0..n {
                let (yref, xref, href, wref) = corner_to_center(
                    proposals[[i, j, 0]],
                    proposals[[i, j, 1]],
                    proposals[[i, j, 2]],
                    proposals[[i, j, 3]],
                );
                let p = [
                    pred[[i, j, 0]],
                    pred[[i, j, 1]],
                    pred[[i, j, 2]],
                    pred[[i, j, 3]],
                ];
                let (ymin, xmin, ymax, xmax) =
                    Self::decode_single(p, yref, xref, href, wref, head_prior_scaling);
                out[[i, j, 0]] = ymin;
                out[[i, j, 1]] = xmin;
                out[[i, j, 2]] = ymax;
                out[[i, j, 3]] = xmax;
            }
        }

        Ok(out)
    }
}
