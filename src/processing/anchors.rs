use ndarray::{Array1, Array2};
use crate::config::settings::Settings;
use crate::error::errors::{Error, Result};
use crate::processing::geometry::center_to_corner;

/// Anchor geometry for one feature-map layer: per-cell center coordinates
/// (normalized to [0, 1]) plus the per-location anchor shapes. The full
/// anchor set is the Cartesian combination of grid cell x shape.
#[derive(Debug, Clone)]
pub struct LayerAnchors {
    /// (H, W) normalized center y per grid cell.
    pub y_centers: Array2<f32>,
    /// (H, W) normalized center x per grid cell.
    pub x_centers: Array2<f32>,
    /// (A,) anchor heights.
    pub heights: Array1<f32>,
    /// (A,) anchor widths.
    pub widths: Array1<f32>,
    pub num_anchors: usize,
}

impl LayerAnchors {
    pub fn grid_shape(&self) -> (usize, usize) {
        self.y_centers.dim()
    }

    /// Total anchor count on this layer: H * W * A.
    pub fn len(&self) -> usize {
        let (h, w) = self.grid_shape();
        h * w * self.num_anchors
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Corner-form boxes for every anchor on this layer, row-major over
    /// (grid y, grid x, shape index).
    pub fn corner_boxes(&self) -> Array2<f32> {
        let (gh, gw) = self.grid_shape();
        let mut boxes = Array2::<f32>::zeros((self.len(), 4));

        let mut row = 0;
        for gy in 0..gh {
            for gx in 0..gw {
                let cy = self.y_centers[[gy, gx]];
                let cx = self.x_centers[[gy, gx]];
                for k in 0..self.num_anchors {
                    let (ymin, xmin, ymax, xmax) =
                        center_to_corner(cy, cx, self.heights[k], self.widths[k]);
                    boxes[[row, 0]] = ymin;
                    boxes[[row, 1]] = xmin;
                    boxes[[row, 2]] = ymax;
                    boxes[[row, 3]] = xmax;
                    row += 1;
                }
            }
        }

        boxes
    }
}

/// Deterministic anchor-geometry generator. Built once per model
/// configuration; the generated layers are immutable and reused across all
/// training and inference calls.
#[derive(Debug, Clone)]
pub struct AnchorCreator {
    img_shape: (usize, usize),
    layers_shapes: Vec<(usize, usize)>,
    anchor_scales: Vec<Vec<f32>>,
    extra_anchor_scales: Vec<Vec<f32>>,
    anchor_ratios: Vec<Vec<f32>>,
    layer_steps: Vec<usize>,
    anchor_offset: f32,
}

impl AnchorCreator {
    pub fn new(
        img_shape: (usize, usize),
        layers_shapes: Vec<(usize, usize)>,
        anchor_scales: Vec<Vec<f32>>,
        extra_anchor_scales: Vec<Vec<f32>>,
        anchor_ratios: Vec<Vec<f32>>,
        layer_steps: Vec<usize>,
    ) -> Result<Self> {
        let num_layers = layers_shapes.len();
        if anchor_scales.len() != num_layers
            || extra_anchor_scales.len() != num_layers
            || anchor_ratios.len() != num_layers
            || layer_steps.len() != num_layers
        {
            return Err(Error::LayerConfig(format!(
                "expected {} entries per list, got scales={} extra_scales={} ratios={} steps={}",
                num_layers,
                anchor_scales.len(),
                extra_anchor_scales.len(),
                anchor_ratios.len(),
                layer_steps.len()
            )));
        }

        Ok(AnchorCreator {
            img_shape,
            layers_shapes,
            anchor_scales,
            extra_anchor_scales,
            anchor_ratios,
            layer_steps,
            // pixel-center convention
            anchor_offset: 0.5,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            (settings.image_shape[0], settings.image_shape[1]),
            settings.layers.iter().map(|l| (l.shape[0], l.shape[1])).collect(),
            settings.layers.iter().map(|l| l.scales.clone()).collect(),
            settings.layers.iter().map(|l| l.extra_scales.clone()).collect(),
            settings.layers.iter().map(|l| l.ratios.clone()).collect(),
            settings.layers.iter().map(|l| l.step).collect(),
        )
    }

    pub fn num_layers(&self) -> usize {
        self.layers_shapes.len()
    }

    /// Anchors for a single layer. Grid centers land at
    /// (index + 0.5) * step / image_dim; shapes are the extra scales as
    /// squares followed by every (scale, ratio) pair with
    /// h = scale / sqrt(ratio), w = scale * sqrt(ratio).
    pub fn layer_anchors(&self, layer_index: usize) -> LayerAnchors {
        let (gh, gw) = self.layers_shapes[layer_index];
        let step = self.layer_steps[layer_index] as f32;
        let offset = self.anchor_offset;

        let y_centers = Array2::from_shape_fn((gh, gw), |(gy, _)| {
            (gy as f32 + offset) * step / self.img_shape.0 as f32
        });
        let x_centers = Array2::from_shape_fn((gh, gw), |(_, gx)| {
            (gx as f32 + offset) * step / self.img_shape.1 as f32
        });

        let scales = &self.anchor_scales[layer_index];
        let extra_scales = &self.extra_anchor_scales[layer_index];
        let ratios = &self.anchor_ratios[layer_index];

        let num_anchors = extra_scales.len() + scales.len() * ratios.len();
        let mut heights = Vec::with_capacity(num_anchors);
        let mut widths = Vec::with_capacity(num_anchors);

        for &scale in extra_scales {
            heights.push(scale);
            widths.push(scale);
        }
        for &scale in scales {
            for &ratio in ratios {
                heights.push(scale / ratio.sqrt());
                widths.push(scale * ratio.sqrt());
            }
        }

        LayerAnchors {
            y_centers,
            x_centers,
            heights: Array1::from(heights),
            widths: Array1::from(widths),
            num_anchors,
        }
    }

    /// All layers plus the per-location anchor count of each.
    pub fn all_anchors(&self) -> (Vec<LayerAnchors>, Vec<usize>) {
        let mut all = Vec::with_capacity(self.num_layers());
        let mut counts = Vec::with_capacity(self.num_layers());
        for layer_index in 0..self.num_layers() {
            let layer = self.layer_anchors(layer_index);
            counts.push(layer.num_anchors);
            all.push(layer);
        }
        (all, counts)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    fn creator() -> AnchorCreator {
        AnchorCreator::new(
            (300, 300),
            vec![(3, 3), (2, 2)],
            vec![vec![0.2], vec![0.4]],
            vec![vec![0.25], vec![0.5]],
            vec![vec![1.0, 2.0, 0.5], vec![1.0]],
            vec![100, 150],
        )
        .unwrap()
    }

    #[test]
    fn test_grid_centers() {
        let layer = creator().layer_anchors(0);
        assert_eq!(layer.grid_shape(), (3, 3));
        // (index + 0.5) * step / image_dim
        assert_relative_eq!(layer.y_centers[[0, 0]], 0.5 * 100.0 / 300.0);
        assert_relative_eq!(layer.y_centers[[2, 1]], 2.5 * 100.0 / 300.0);
        assert_relative_eq!(layer.x_centers[[0, 2]], 2.5 * 100.0 / 300.0);
        // y varies along rows only, x along columns only
        assert_relative_eq!(layer.y_centers[[1, 0]], layer.y_centers[[1, 2]]);
        assert_relative_eq!(layer.x_centers[[0, 1]], layer.x_centers[[2, 1]]);
    }

    #[test]
    fn test_anchor_shapes_order() {
        let layer = creator().layer_anchors(0);
        // 1 extra scale + 1 scale x 3 ratios
        assert_eq!(layer.num_anchors, 4);
        // extra scale first, square
        assert_relative_eq!(layer.heights[0], 0.25);
        assert_relative_eq!(layer.widths[0], 0.25);
        // ratio 1.0
        assert_relative_eq!(layer.heights[1], 0.2);
        assert_relative_eq!(layer.widths[1], 0.2);
        // ratio 2.0: h = s / sqrt(r), w = s * sqrt(r)
        assert_relative_eq!(layer.heights[2], 0.2 / 2.0_f32.sqrt());
        assert_relative_eq!(layer.widths[2], 0.2 * 2.0_f32.sqrt());
        // ratio 0.5
        assert_relative_eq!(layer.heights[3], 0.2 / 0.5_f32.sqrt());
        assert_relative_eq!(layer.widths[3], 0.2 * 0.5_f32.sqrt());
    }

    #[test]
    fn test_all_anchors_counts() {
        let (layers, counts) = creator().all_anchors();
        assert_eq!(layers.len(), 2);
        assert_eq!(counts, vec![4, 2]);
        assert_eq!(layers[0].len(), 3 * 3 * 4);
        assert_eq!(layers[1].len(), 2 * 2 * 2);
    }

    #[test]
    fn test_corner_boxes_layout() {
        let layer = creator().layer_anchors(1);
        let boxes = layer.corner_boxes();
        assert_eq!(boxes.dim(), (8, 4));

        // first row corresponds to grid (0, 0), shape 0
        let cy = layer.y_centers[[0, 0]];
        let cx = layer.x_centers[[0, 0]];
        assert_relative_eq!(boxes[[0, 0]], cy - 0.5 / 2.0);
        assert_relative_eq!(boxes[[0, 1]], cx - 0.5 / 2.0);
        assert_relative_eq!(boxes[[0, 2]], cy + 0.5 / 2.0);
        assert_relative_eq!(boxes[[0, 3]], cx + 0.5 / 2.0);
    }

    #[test]
    fn test_deterministic() {
        let c = creator();
        let a = c.layer_anchors(0);
        let b = c.layer_anchors(0);
        assert_eq!(a.y_centers, b.y_centers);
        assert_eq!(a.heights, b.heights);
    }

    #[test]
    fn test_mismatched_lists_rejected() {
        let result = AnchorCreator::new(
            (300, 300),
            vec![(3, 3), (2, 2)],
            vec![vec![0.2]],
            vec![vec![0.25], vec![0.5]],
            vec![vec![1.0], vec![1.0]],
            vec![100, 150],
        );
        assert!(result.is_err());
    }
}
