//! Marker detection on full frames.

use crate::components::dark_components;
use crate::decode::QuadDecoder;
use crate::quad::{fit_quad, quad_center};
use crate::threshold::adaptive_mean_threshold;
use crate::{Dictionary, Matcher};
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use touchhear_core::{convex_hull, GrayImageView};

/// Tunables for candidate extraction and decoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArucoDetectorParams {
    /// Half-size of the adaptive threshold window, in pixels.
    pub threshold_radius: usize,
    /// A pixel is dark when it is this much below its local mean.
    pub threshold_offset: f32,
    /// Smallest accepted marker side, in pixels.
    pub min_side_px: f32,
    /// Largest accepted marker side as a fraction of the shorter image side.
    pub max_side_frac: f32,
    /// Minimum area ratio between the fitted quad and the candidate hull.
    pub min_quad_fill: f32,
    /// Marker border width in cells.
    pub border_bits: usize,
    /// Require border-black ratio >= this.
    pub min_border_score: f32,
    /// Bit errors tolerated when matching against the dictionary.
    pub max_hamming: u8,
    /// Also try white-bordered (inverted) markers.
    pub allow_inverted: bool,
}

impl Default for ArucoDetectorParams {
    fn default() -> Self {
        Self {
            threshold_radius: 7,
            threshold_offset: 7.0,
            min_side_px: 12.0,
            max_side_frac: 0.8,
            min_quad_fill: 0.85,
            border_bits: 1,
            min_border_score: 0.85,
            max_hamming: 1,
            allow_inverted: false,
        }
    }
}

/// One decoded marker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerDetection {
    pub id: u32,
    /// Image corners, clockwise on screen, starting nearest the image origin.
    pub corners: [Point2<f32>; 4],
    /// Centroid of `corners`.
    pub center: Point2<f32>,
    pub rotation: u8,
    pub hamming: u8,
    pub score: f32,
    pub border_score: f32,
    /// Observed inner bits (row-major, black=1).
    pub code: u64,
    pub inverted: bool,
}

/// Finds and decodes square fiducials of one dictionary.
#[derive(Clone, Debug)]
pub struct ArucoDetector {
    params: ArucoDetectorParams,
    matcher: Matcher,
}

impl ArucoDetector {
    pub fn new(dict: Dictionary, params: ArucoDetectorParams) -> Self {
        let matcher = Matcher::new(dict, params.max_hamming);
        Self { params, matcher }
    }

    pub fn params(&self) -> &ArucoDetectorParams {
        &self.params
    }

    pub fn dictionary(&self) -> Dictionary {
        self.matcher.dictionary()
    }

    /// Detect markers; at most one detection (the best scored) per id.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn detect(&self, image: &GrayImageView<'_>) -> Vec<MarkerDetection> {
        let p = &self.params;
        let (w, h) = (image.width, image.height);
        if w == 0 || h == 0 || image.data.len() != w * h {
            return Vec::new();
        }

        let dict = self.matcher.dictionary();
        let Some(mut decoder) =
            QuadDecoder::new(dict.marker_size, p.border_bits, p.min_border_score, p.allow_inverted)
        else {
            return Vec::new();
        };

        let binary = adaptive_mean_threshold(image, p.threshold_radius, p.threshold_offset);
        let min_side = p.min_side_px.max(1.0) as usize;
        let max_side = ((w.min(h) as f32) * p.max_side_frac).max(min_side as f32) as usize;
        let blobs = dark_components(&binary, w, h, min_side, max_side);

        let bits = dict.bit_count().max(1) as f32;
        let mut out = Vec::new();
        let mut quads = 0usize;
        for blob in &blobs {
            let hull = convex_hull(&blob.outline);
            let Some(corners) = fit_quad(&hull, p.min_quad_fill, p.min_side_px) else {
                continue;
            };
            quads += 1;
            let Some(obs) = decoder.decode(image, &corners) else {
                continue;
            };
            let Some(m) = self.matcher.match_code(obs.code) else {
                continue;
            };
            let score = (obs.border_score * (1.0 - m.hamming as f32 / bits)).clamp(0.0, 1.0);
            out.push(MarkerDetection {
                id: m.id,
                corners,
                center: quad_center(&corners),
                rotation: m.rotation,
                hamming: m.hamming,
                score,
                border_score: obs.border_score,
                code: obs.code,
                inverted: obs.inverted,
            });
        }

        debug!(
            "aruco: {} blobs, {} quads, {} decoded",
            blobs.len(),
            quads,
            out.len()
        );
        keep_best_per_id(out)
    }
}

fn keep_best_per_id(dets: Vec<MarkerDetection>) -> Vec<MarkerDetection> {
    let mut best: HashMap<u32, MarkerDetection> = HashMap::new();
    for d in dets {
        match best.get(&d.id) {
            Some(prev) if prev.score >= d.score => {}
            _ => {
                best.insert(d.id, d);
            }
        }
    }
    let mut out: Vec<MarkerDetection> = best.into_values().collect();
    out.sort_by_key(|d| d.id);
    out
}
