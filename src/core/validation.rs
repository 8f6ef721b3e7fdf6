use crate::core::error::{AdasError, Result};
use crate::core::models::{BoundingBox, ControlCommand, LaneModel, MotionPlan};

/// Validates a detection box.
///
/// Coordinates must be finite and non-negative with `x2 > x1` and `y2 > y1`,
/// and the confidence must lie in `[0, 1]`.
///
/// # Arguments
///
/// * `bbox` - Detection box to validate.
///
/// # Returns
///
/// `Ok(())` for a well-formed box, otherwise a `Validation` error.
///
/// # Examples
///
/// ```rust
/// use adas::core::models::BoundingBox;
/// use adas::core::validation::validate_bounding_box;
///
/// let bbox = BoundingBox::new(10.0, 10.0, 60.0, 90.0, 0.8, "vehicle");
/// assert!(validate_bounding_box(&bbox).is_ok());
///
/// let flipped = BoundingBox::new(60.0, 10.0, 10.0, 90.0, 0.8, "vehicle");
/// assert!(validate_bounding_box(&flipped).is_err());
/// ```
pub fn validate_bounding_box(bbox: &BoundingBox) -> Result<()> {
    let coords = [bbox.x1, bbox.y1, bbox.x2, bbox.y2];
    if !coords.iter().all(|v| v.is_finite()) {
        return Err(AdasError::Validation(format!(
            "non-finite box coordinates: ({}, {}, {}, {})",
            bbox.x1, bbox.y1, bbox.x2, bbox.y2
        )));
    }
    if bbox.x1 < 0.0 || bbox.y1 < 0.0 {
        return Err(AdasError::Validation(format!(
            "negative coordinates not allowed: ({}, {})",
            bbox.x1, bbox.y1
        )));
    }
    if bbox.x2 <= bbox.x1 {
        return Err(AdasError::Validation(format!(
            "invalid box width: x2={} <= x1={}",
            bbox.x2, bbox.x1
        )));
    }
    if bbox.y2 <= bbox.y1 {
        return Err(AdasError::Validation(format!(
            "invalid box height: y2={} <= y1={}",
            bbox.y2, bbox.y1
        )));
    }
    if !bbox.confidence.is_finite() || !(0.0..=1.0).contains(&bbox.confidence) {
        return Err(AdasError::Validation(format!(
            "confidence must be in [0, 1], got {}",
            bbox.confidence
        )));
    }
    Ok(())
}

/// Validates lane geometry.
///
/// The center offset and every curvature coefficient must be finite.
///
/// # Arguments
///
/// * `lane` - Lane model to validate.
///
/// # Returns
///
/// `Ok(())` for well-formed lane geometry, otherwise a `Validation` error.
pub fn validate_lane_model(lane: &LaneModel) -> Result<()> {
    if !lane.center_offset.is_finite() {
        return Err(AdasError::Validation(format!(
            "non-finite lane center offset: {}",
            lane.center_offset
        )));
    }
    if let Some(curvature) = &lane.curvature {
        if !curvature.iter().all(|c| c.is_finite()) {
            return Err(AdasError::Validation(
                "non-finite lane curvature coefficient".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates a motion plan.
///
/// The target speed must be finite and non-negative and the steering angle
/// finite. The planner runs this on its own output, so a failure here marks
/// an internal contradiction rather than bad sensor data.
///
/// # Arguments
///
/// * `plan` - Motion plan to validate.
///
/// # Returns
///
/// `Ok(())` for a well-formed plan, otherwise a `Validation` error.
///
/// # Examples
///
/// ```rust
/// use adas::core::models::MotionPlan;
/// use adas::core::validation::validate_motion_plan;
///
/// let plan = MotionPlan::new(12.0, 3.5, "cruise|lane-centering");
/// assert!(validate_motion_plan(&plan).is_ok());
///
/// let broken = MotionPlan::new(-1.0, 0.0, "cruise|no-lane");
/// assert!(validate_motion_plan(&broken).is_err());
/// ```
pub fn validate_motion_plan(plan: &MotionPlan) -> Result<()> {
    if !plan.target_speed_mps.is_finite() {
        return Err(AdasError::Validation(format!(
            "non-finite target speed: {}",
            plan.target_speed_mps
        )));
    }
    if plan.target_speed_mps < 0.0 {
        return Err(AdasError::Validation(format!(
            "negative target speed not allowed: {}",
            plan.target_speed_mps
        )));
    }
    if !plan.steering_angle_deg.is_finite() {
        return Err(AdasError::Validation(format!(
            "non-finite steering angle: {}",
            plan.steering_angle_deg
        )));
    }
    Ok(())
}

/// Validates an actuator command.
///
/// All channels must be finite and within their normalized ranges, and
/// throttle and brake must never be strictly positive at the same time.
///
/// # Arguments
///
/// * `cmd` - Control command to validate.
///
/// # Returns
///
/// `Ok(())` for a well-formed command, otherwise a `Validation` error.
///
/// # Examples
///
/// ```rust
/// use adas::core::models::ControlCommand;
/// use adas::core::validation::validate_control_command;
///
/// assert!(validate_control_command(&ControlCommand::new(0.3, 0.0, 0.1)).is_ok());
/// assert!(validate_control_command(&ControlCommand::new(0.3, 0.2, 0.1)).is_err());
/// ```
pub fn validate_control_command(cmd: &ControlCommand) -> Result<()> {
    if !cmd.throttle.is_finite() || !(0.0..=1.0).contains(&cmd.throttle) {
        return Err(AdasError::Validation(format!(
            "throttle must be in [0, 1], got {}",
            cmd.throttle
        )));
    }
    if !cmd.brake.is_finite() || !(0.0..=1.0).contains(&cmd.brake) {
        return Err(AdasError::Validation(format!(
            "brake must be in [0, 1], got {}",
            cmd.brake
        )));
    }
    if !cmd.steering.is_finite() || !(-1.0..=1.0).contains(&cmd.steering) {
        return Err(AdasError::Validation(format!(
            "steering must be in [-1, 1], got {}",
            cmd.steering
        )));
    }
    if cmd.throttle > 0.0 && cmd.brake > 0.0 {
        return Err(AdasError::Validation(format!(
            "throttle ({}) and brake ({}) must not both be positive",
            cmd.throttle, cmd.brake
        )));
    }
    Ok(())
}
