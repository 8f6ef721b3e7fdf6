use crate::core::error::Result;
use crate::core::models::{BoundingBox, LaneModel};
use ndarray::Array1;

/// Defines the object-detection input boundary of the pipeline.
///
/// The core never runs inference itself; it consumes detector output as plain
/// bounding boxes through this trait so backends can be swapped without
/// touching tracking or planning. Implementations may fail per frame; the
/// runner substitutes an empty detection list and keeps the control loop
/// alive.
pub trait DetectionSource {
    /// Produces the detections for one frame.
    ///
    /// # Arguments
    ///
    /// * `frame_id` - Monotonic frame identifier.
    ///
    /// # Returns
    ///
    /// The detected bounding boxes, possibly empty.
    fn detect(&mut self, frame_id: u64) -> Result<Vec<BoundingBox>>;
}

/// Defines the lane-geometry input boundary of the pipeline.
///
/// Returning `Ok(None)` means the estimator ran but found no usable lane;
/// the planner then holds the wheel straight rather than guessing.
pub trait LaneSource {
    /// Produces the lane estimate for one frame.
    ///
    /// # Arguments
    ///
    /// * `frame_id` - Monotonic frame identifier.
    ///
    /// # Returns
    ///
    /// The lane model, or `None` when no lane is visible.
    fn estimate(&mut self, frame_id: u64) -> Result<Option<LaneModel>>;
}

/// Represents a deterministic stand-in detector for tests and simulation.
///
/// Emits one lead-vehicle-like box in the ego lane each frame, optionally
/// drifting sideways to exercise association. Real deployments replace this
/// with an inference-backed [`DetectionSource`].
///
/// # Examples
///
/// ```rust
/// use adas::perception::{DetectionSource, SyntheticDetectionSource};
///
/// let mut detector = SyntheticDetectionSource::new(1280.0, 720.0);
/// let detections = detector.detect(0).unwrap();
/// assert_eq!(detections.len(), 1);
/// assert_eq!(detections[0].label, "vehicle");
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticDetectionSource {
    /// Frame width in pixels.
    pub width_px: f64,
    /// Frame height in pixels.
    pub height_px: f64,
    /// Minimum confidence a detection must carry to be reported.
    pub confidence_threshold: f64,
    /// Peak sideways drift of the synthetic box in pixels.
    pub drift_amplitude_px: f64,
}

impl SyntheticDetectionSource {
    /// Creates a new `SyntheticDetectionSource` instance for a frame size.
    ///
    /// # Arguments
    ///
    /// * `width_px` - Frame width in pixels.
    /// * `height_px` - Frame height in pixels.
    ///
    /// # Returns
    ///
    /// A new `SyntheticDetectionSource` instance with a 0.35 confidence
    /// threshold and no drift.
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self {
            width_px,
            height_px,
            confidence_threshold: 0.35,
            drift_amplitude_px: 0.0,
        }
    }

    /// Enables sideways drift of the synthetic box.
    ///
    /// # Arguments
    ///
    /// * `amplitude_px` - Peak drift from the lane center in pixels.
    ///
    /// # Returns
    ///
    /// The source with drift enabled.
    pub fn with_drift(mut self, amplitude_px: f64) -> Self {
        self.drift_amplitude_px = amplitude_px;
        self
    }
}

impl Default for SyntheticDetectionSource {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

impl DetectionSource for SyntheticDetectionSource {
    fn detect(&mut self, frame_id: u64) -> Result<Vec<BoundingBox>> {
        // Fixed stand-in confidence; below the threshold the frame is empty.
        let confidence = 0.8;
        if confidence < self.confidence_threshold {
            return Ok(Vec::new());
        }

        let box_w = self.width_px * 0.12;
        let box_h = self.height_px * 0.18;
        let drift = self.drift_amplitude_px * ((frame_id as f64) * 0.1).sin();
        let center_x = self.width_px / 2.0 + drift;
        let bottom_y = self.height_px * 0.7;

        Ok(vec![BoundingBox::new(
            center_x - box_w / 2.0,
            bottom_y - box_h,
            center_x + box_w / 2.0,
            bottom_y,
            confidence,
            "vehicle",
        )])
    }
}

/// Represents a deterministic stand-in lane estimator.
///
/// Reports a lane with a configurable center offset and optional curvature
/// polynomial. A dropout interval can blank the estimate periodically to
/// exercise degraded-lane planning.
///
/// # Examples
///
/// ```rust
/// use adas::perception::{LaneSource, SyntheticLaneSource};
///
/// let mut lanes = SyntheticLaneSource::new();
/// let lane = lanes.estimate(0).unwrap().unwrap();
/// assert_eq!(lane.center_offset, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticLaneSource {
    /// Normalized lateral offset reported each frame.
    pub center_offset: f64,
    /// Curvature polynomial coefficients, lowest order first.
    pub curvature: Option<Array1<f64>>,
    /// Dropout interval; 0 disables dropout.
    pub dropout_every: u64,
}

impl SyntheticLaneSource {
    /// Creates a new `SyntheticLaneSource` instance reporting a centered lane.
    ///
    /// # Returns
    ///
    /// A new `SyntheticLaneSource` instance with zero offset, no curvature,
    /// and no dropout.
    pub fn new() -> Self {
        Self {
            center_offset: 0.0,
            curvature: None,
            dropout_every: 0,
        }
    }

    /// Sets the reported lateral offset.
    ///
    /// # Arguments
    ///
    /// * `center_offset` - Normalized offset, positive when the vehicle sits
    ///   right of the lane center.
    ///
    /// # Returns
    ///
    /// The source with the offset applied.
    pub fn with_center_offset(mut self, center_offset: f64) -> Self {
        self.center_offset = center_offset;
        self
    }

    /// Sets the reported curvature polynomial.
    ///
    /// # Arguments
    ///
    /// * `coeffs` - Coefficients, lowest order first.
    ///
    /// # Returns
    ///
    /// The source with curvature applied.
    pub fn with_curvature(mut self, coeffs: Array1<f64>) -> Self {
        self.curvature = Some(coeffs);
        self
    }

    /// Blanks the estimate on every frame whose id is a multiple of `n`.
    ///
    /// # Arguments
    ///
    /// * `n` - Dropout interval in frames; 0 disables dropout.
    ///
    /// # Returns
    ///
    /// The source with dropout applied.
    pub fn with_dropout_every(mut self, n: u64) -> Self {
        self.dropout_every = n;
        self
    }
}

impl Default for SyntheticLaneSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LaneSource for SyntheticLaneSource {
    fn estimate(&mut self, frame_id: u64) -> Result<Option<LaneModel>> {
        if self.dropout_every > 0 && frame_id % self.dropout_every == 0 {
            return Ok(None);
        }

        let lane = match &self.curvature {
            Some(coeffs) => LaneModel::with_curvature(self.center_offset, coeffs.clone()),
            None => LaneModel::new(self.center_offset),
        };
        Ok(Some(lane))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::validate_bounding_box;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_detector_emits_centered_lead_box() {
        let mut detector = SyntheticDetectionSource::new(1280.0, 720.0);
        let detections = detector.detect(0).unwrap();
        assert_eq!(detections.len(), 1);

        let bbox = &detections[0];
        let (cx, cy) = bbox.center();
        assert_abs_diff_eq!(cx, 640.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.width(), 1280.0 * 0.12, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.height(), 720.0 * 0.18, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.y2, 720.0 * 0.7, epsilon = 1e-9);
        assert!(cy < bbox.y2);
        assert!(validate_bounding_box(bbox).is_ok());
    }

    #[test]
    fn test_detector_respects_confidence_threshold() {
        let mut detector = SyntheticDetectionSource::new(1280.0, 720.0);
        detector.confidence_threshold = 0.9;
        assert!(detector.detect(0).unwrap().is_empty());
    }

    #[test]
    fn test_detector_drift_stays_within_amplitude() {
        let mut detector = SyntheticDetectionSource::new(1280.0, 720.0).with_drift(6.0);
        let mut moved = false;
        for frame_id in 0..50 {
            let detections = detector.detect(frame_id).unwrap();
            let (cx, _) = detections[0].center();
            assert!((cx - 640.0).abs() <= 6.0 + 1e-9);
            if (cx - 640.0).abs() > 1.0 {
                moved = true;
            }
        }
        assert!(moved);
    }

    #[test]
    fn test_lane_source_defaults_to_centered_lane() {
        let mut lanes = SyntheticLaneSource::new();
        let lane = lanes.estimate(7).unwrap().unwrap();
        assert_eq!(lane.center_offset, 0.0);
        assert!(lane.curvature.is_none());
    }

    #[test]
    fn test_lane_source_dropout() {
        let mut lanes = SyntheticLaneSource::new().with_dropout_every(3);
        assert!(lanes.estimate(0).unwrap().is_none());
        assert!(lanes.estimate(1).unwrap().is_some());
        assert!(lanes.estimate(2).unwrap().is_some());
        assert!(lanes.estimate(3).unwrap().is_none());
    }

    #[test]
    fn test_lane_source_passes_curvature_through() {
        let mut lanes = SyntheticLaneSource::new()
            .with_center_offset(0.1)
            .with_curvature(arr1(&[0.05, 0.001]));
        let lane = lanes.estimate(1).unwrap().unwrap();
        assert_abs_diff_eq!(lane.center_offset, 0.1, epsilon = 1e-12);
        assert_eq!(lane.curvature.unwrap().len(), 2);
    }
}
