use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Represents an axis-aligned detection box in image pixels.
///
/// Produced once per frame by the external detector and consumed by the
/// tracker. Coordinates satisfy `x1 < x2` and `y1 < y2` for a valid box;
/// validity is checked by [`validate_bounding_box`](crate::core::validation::validate_bounding_box).
///
/// # Examples
///
/// ```rust
/// use adas::core::models::BoundingBox;
///
/// let bbox = BoundingBox::new(100.0, 200.0, 180.0, 320.0, 0.9, "vehicle");
/// assert_eq!(bbox.center(), (140.0, 260.0));
/// assert_eq!(bbox.height(), 120.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge in pixels.
    pub x1: f64,
    /// Top edge in pixels.
    pub y1: f64,
    /// Right edge in pixels.
    pub x2: f64,
    /// Bottom edge in pixels.
    pub y2: f64,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
    /// Free-form class tag (e.g. `"vehicle"`).
    pub label: String,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` instance.
    ///
    /// # Arguments
    ///
    /// * `x1` - Left edge in pixels.
    /// * `y1` - Top edge in pixels.
    /// * `x2` - Right edge in pixels.
    /// * `y2` - Bottom edge in pixels.
    /// * `confidence` - Detector confidence in `[0, 1]`.
    /// * `label` - Free-form class tag.
    ///
    /// # Returns
    ///
    /// A new `BoundingBox` instance.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64, label: &str) -> Self {
        BoundingBox {
            x1,
            y1,
            x2,
            y2,
            confidence,
            label: label.to_string(),
        }
    }

    /// Returns the box center as `(x, y)` in pixels.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adas::core::models::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(0.0, 0.0, 10.0, 20.0, 1.0, "vehicle");
    /// assert_eq!(bbox.center(), (5.0, 10.0));
    /// ```
    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Returns the box width in pixels.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Returns the box height in pixels.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// Represents per-frame lane geometry from the external lane estimator.
///
/// `center_offset` is the signed lateral offset of the lane center relative to
/// the ego position, normalized by half the frame width (`0.0` is centered,
/// positive means the lane center lies to the right). `curvature`, when
/// present, holds polynomial coefficients in ascending powers; evaluating the
/// polynomial at a forward distance in meters predicts the offset in the same
/// normalized units. A frame without lane data carries no `LaneModel` at all,
/// and the planner degrades gracefully.
///
/// # Examples
///
/// ```rust
/// use adas::core::models::LaneModel;
/// use ndarray::arr1;
///
/// let straight = LaneModel::new(0.05);
/// assert!(straight.curvature.is_none());
///
/// let curved = LaneModel::with_curvature(0.05, arr1(&[0.05, 0.001]));
/// assert!(curved.curvature.is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LaneModel {
    /// Signed lane-center offset, normalized by half the frame width.
    pub center_offset: f64,
    /// Optional offset-vs-distance polynomial coefficients, ascending powers.
    pub curvature: Option<Array1<f64>>,
}

impl LaneModel {
    /// Creates a `LaneModel` with no curvature information.
    ///
    /// # Arguments
    ///
    /// * `center_offset` - Signed, normalized lane-center offset.
    ///
    /// # Returns
    ///
    /// A new `LaneModel` instance.
    pub fn new(center_offset: f64) -> Self {
        LaneModel {
            center_offset,
            curvature: None,
        }
    }

    /// Creates a `LaneModel` carrying curvature polynomial coefficients.
    ///
    /// # Arguments
    ///
    /// * `center_offset` - Signed, normalized lane-center offset.
    /// * `curvature` - Polynomial coefficients, ascending powers.
    ///
    /// # Returns
    ///
    /// A new `LaneModel` instance.
    pub fn with_curvature(center_offset: f64, curvature: Array1<f64>) -> Self {
        LaneModel {
            center_offset,
            curvature: Some(curvature),
        }
    }
}

/// Represents a persistently identified object maintained by the track store.
///
/// `id` is allocated per store and never reused within it. `velocity_mps` is
/// the signed range rate (negative means closing); it is `0.0` on the frame
/// the track is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    /// Stable track identity.
    pub id: u64,
    /// Most recently associated detection box.
    pub bbox: BoundingBox,
    /// Estimated range in meters, never negative.
    pub distance_m: f64,
    /// Signed range rate in m/s; negative when closing.
    pub velocity_mps: f64,
    /// Completed update cycles since creation; 0 on the creation frame.
    pub age: u32,
    /// Consecutive frames without an associated detection.
    pub missed_frames: u32,
}

/// Represents the motion intention produced by the behavior planner.
///
/// Immutable once produced; `reason` records the policy branch taken (e.g.
/// `"following|lane-centering"`) for observability.
///
/// # Examples
///
/// ```rust
/// use adas::core::models::MotionPlan;
///
/// let plan = MotionPlan::new(15.0, -2.5, "cruise|lane-centering");
/// assert_eq!(plan.target_speed_mps, 15.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionPlan {
    /// Target speed in m/s, never negative.
    pub target_speed_mps: f64,
    /// Target steering angle in degrees, within the configured maximum.
    pub steering_angle_deg: f64,
    /// Policy branch taken, `"<speed-branch>|<lane-branch>"`.
    pub reason: String,
}

impl MotionPlan {
    /// Creates a new `MotionPlan` instance.
    ///
    /// # Arguments
    ///
    /// * `target_speed_mps` - Target speed in m/s.
    /// * `steering_angle_deg` - Target steering angle in degrees.
    /// * `reason` - Policy branch taken.
    ///
    /// # Returns
    ///
    /// A new `MotionPlan` instance.
    pub fn new(target_speed_mps: f64, steering_angle_deg: f64, reason: &str) -> Self {
        MotionPlan {
            target_speed_mps,
            steering_angle_deg,
            reason: reason.to_string(),
        }
    }
}

/// Represents normalized actuator values released to the vehicle.
///
/// `throttle` and `brake` are never both strictly positive; the synthesizer
/// produces the command with that invariant and the safety monitor re-asserts
/// it before release.
///
/// # Examples
///
/// ```rust
/// use adas::core::models::ControlCommand;
///
/// let cmd = ControlCommand::new(0.4, 0.0, -0.1);
/// assert_eq!(cmd.throttle * cmd.brake, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlCommand {
    /// Throttle in `[0, 1]`.
    pub throttle: f64,
    /// Brake in `[0, 1]`.
    pub brake: f64,
    /// Steering in `[-1, 1]`, positive to the right.
    pub steering: f64,
}

impl ControlCommand {
    /// Creates a new `ControlCommand` instance.
    ///
    /// # Arguments
    ///
    /// * `throttle` - Throttle in `[0, 1]`.
    /// * `brake` - Brake in `[0, 1]`.
    /// * `steering` - Steering in `[-1, 1]`.
    ///
    /// # Returns
    ///
    /// A new `ControlCommand` instance.
    pub fn new(throttle: f64, brake: f64, steering: f64) -> Self {
        ControlCommand {
            throttle,
            brake,
            steering,
        }
    }

    /// Returns the maximally conservative command: full brake, zero throttle,
    /// zero steering.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adas::core::models::ControlCommand;
    ///
    /// let cmd = ControlCommand::full_stop();
    /// assert_eq!((cmd.throttle, cmd.brake, cmd.steering), (0.0, 1.0, 0.0));
    /// ```
    pub fn full_stop() -> Self {
        ControlCommand {
            throttle: 0.0,
            brake: 1.0,
            steering: 0.0,
        }
    }
}

/// Represents one frame's worth of perception input handed to the pipeline.
///
/// # Examples
///
/// ```rust
/// use adas::core::models::{BoundingBox, FrameInput};
///
/// let frame = FrameInput::new(
///     7,
///     0.35,
///     vec![BoundingBox::new(600.0, 330.0, 680.0, 430.0, 0.8, "vehicle")],
///     None,
/// );
/// assert_eq!(frame.detections.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Caller-assigned frame identifier.
    pub frame_id: u64,
    /// Capture timestamp in seconds.
    pub timestamp_s: f64,
    /// Detections for this frame; may be empty.
    pub detections: Vec<BoundingBox>,
    /// Lane geometry for this frame; absent when no lane was detected.
    pub lane: Option<LaneModel>,
}

impl FrameInput {
    /// Creates a new `FrameInput` instance.
    ///
    /// # Arguments
    ///
    /// * `frame_id` - Caller-assigned frame identifier.
    /// * `timestamp_s` - Capture timestamp in seconds.
    /// * `detections` - Detections for this frame.
    /// * `lane` - Lane geometry, if any.
    ///
    /// # Returns
    ///
    /// A new `FrameInput` instance.
    pub fn new(
        frame_id: u64,
        timestamp_s: f64,
        detections: Vec<BoundingBox>,
        lane: Option<LaneModel>,
    ) -> Self {
        FrameInput {
            frame_id,
            timestamp_s,
            detections,
            lane,
        }
    }

    /// Creates a frame with no detections and no lane, the substitute used
    /// when the perception boundary fails.
    ///
    /// # Arguments
    ///
    /// * `frame_id` - Caller-assigned frame identifier.
    /// * `timestamp_s` - Capture timestamp in seconds.
    ///
    /// # Returns
    ///
    /// An empty `FrameInput` instance.
    pub fn empty(frame_id: u64, timestamp_s: f64) -> Self {
        FrameInput {
            frame_id,
            timestamp_s,
            detections: Vec::new(),
            lane: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_bounding_box_geometry() {
        let bbox = BoundingBox::new(10.0, 20.0, 50.0, 100.0, 0.75, "vehicle");
        assert_eq!(bbox.center(), (30.0, 60.0));
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 80.0);
        assert_eq!(bbox.label, "vehicle");
    }

    #[test]
    fn test_lane_model_constructors() {
        let lane = LaneModel::new(-0.2);
        assert_eq!(lane.center_offset, -0.2);
        assert!(lane.curvature.is_none());

        let lane = LaneModel::with_curvature(0.0, arr1(&[0.0, 0.01, -0.0002]));
        assert_eq!(lane.curvature.as_ref().map(|c| c.len()), Some(3));
    }

    #[test]
    fn test_full_stop_command() {
        let cmd = ControlCommand::full_stop();
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.brake, 1.0);
        assert_eq!(cmd.steering, 0.0);
    }

    #[test]
    fn test_empty_frame() {
        let frame = FrameInput::empty(3, 0.15);
        assert_eq!(frame.frame_id, 3);
        assert!(frame.detections.is_empty());
        assert!(frame.lane.is_none());
    }

    #[test]
    fn test_command_serializes() {
        let cmd = ControlCommand::new(0.25, 0.0, -0.5);
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"throttle\":0.25"));
    }
}
