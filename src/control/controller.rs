use tracing::debug;

use crate::core::error::{AdasError, Result};
use crate::core::models::{ControlCommand, MotionPlan};
use crate::core::validation::{validate_control_command, validate_motion_plan};

/// Splits a proportional speed correction into throttle and brake channels.
///
/// A non-negative speed error drives the throttle, a negative one the brake;
/// the unused channel is exactly `0.0` so the channels are never both active.
///
/// # Arguments
///
/// * `target_speed_mps` - Speed the plan asks for.
/// * `current_speed_mps` - Measured ego speed.
/// * `gain` - Proportional gain applied to the speed error.
///
/// # Returns
///
/// A `(throttle, brake)` tuple, each in `[0, 1]`.
///
/// # Examples
///
/// ```rust
/// use adas::control::controller::longitudinal_split;
///
/// let (throttle, brake) = longitudinal_split(15.0, 10.0, 0.15);
/// assert_eq!((throttle, brake), (0.75, 0.0));
/// ```
pub fn longitudinal_split(target_speed_mps: f64, current_speed_mps: f64, gain: f64) -> (f64, f64) {
    let speed_error = target_speed_mps - current_speed_mps;
    if speed_error >= 0.0 {
        ((gain * speed_error).min(1.0), 0.0)
    } else {
        (0.0, (gain * -speed_error).min(1.0))
    }
}

/// Represents the stateless mapping from a motion plan to actuator values.
///
/// Speed control is a proportional split around the measured speed; steering
/// is the plan angle normalized by the physical maximum, with a deadband to
/// suppress jitter around center. The synthesizer holds no cross-frame state,
/// so the same plan and speed always produce the same command.
///
/// # Examples
///
/// ```rust
/// use adas::control::controller::CommandSynthesizer;
/// use adas::core::models::MotionPlan;
///
/// let synthesizer = CommandSynthesizer::new(0.15, 0.5, 22.0);
/// let plan = MotionPlan::new(15.0, 11.0, "cruise|lane-centering");
/// let cmd = synthesizer.convert(&plan, 10.0).unwrap();
/// assert_eq!(cmd.throttle, 0.75);
/// assert_eq!(cmd.brake, 0.0);
/// assert_eq!(cmd.steering, 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    speed_gain: f64,
    steering_deadband_deg: f64,
    max_steering_angle_deg: f64,
}

impl CommandSynthesizer {
    /// Creates a new `CommandSynthesizer` instance.
    ///
    /// # Arguments
    ///
    /// * `speed_gain` - Proportional gain for the speed error.
    /// * `steering_deadband_deg` - Angles below this magnitude map to zero.
    /// * `max_steering_angle_deg` - Physical maximum used for normalization.
    ///
    /// # Returns
    ///
    /// A new `CommandSynthesizer` instance.
    pub fn new(speed_gain: f64, steering_deadband_deg: f64, max_steering_angle_deg: f64) -> Self {
        Self {
            speed_gain,
            steering_deadband_deg,
            max_steering_angle_deg,
        }
    }

    /// Converts a motion plan into a normalized actuator command.
    ///
    /// # Arguments
    ///
    /// * `plan` - Motion plan to realize.
    /// * `current_speed_mps` - Measured ego speed; negative values are
    ///   accepted and widen the speed error.
    ///
    /// # Returns
    ///
    /// The validated command, or a `Control` error on contradictory inputs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adas::control::controller::CommandSynthesizer;
    /// use adas::core::models::MotionPlan;
    ///
    /// let synthesizer = CommandSynthesizer::new(0.15, 0.5, 22.0);
    /// let plan = MotionPlan::new(5.0, 0.0, "following|no-lane");
    /// let cmd = synthesizer.convert(&plan, 10.0).unwrap();
    /// assert_eq!(cmd.brake, 0.75);
    /// assert_eq!(cmd.throttle, 0.0);
    /// ```
    pub fn convert(&self, plan: &MotionPlan, current_speed_mps: f64) -> Result<ControlCommand> {
        validate_motion_plan(plan)
            .map_err(|err| AdasError::Control(format!("plan rejected: {err}")))?;
        if !current_speed_mps.is_finite() {
            return Err(AdasError::Control(format!(
                "non-finite current speed: {current_speed_mps}"
            )));
        }

        let (throttle, brake) =
            longitudinal_split(plan.target_speed_mps, current_speed_mps, self.speed_gain);
        let steering = self.steering_from_angle(plan.steering_angle_deg);

        let cmd = ControlCommand::new(throttle, brake, steering);
        validate_control_command(&cmd)
            .map_err(|err| AdasError::Control(format!("command contradiction: {err}")))?;

        debug!(
            throttle = cmd.throttle,
            brake = cmd.brake,
            steering = cmd.steering,
            "command synthesized"
        );
        Ok(cmd)
    }

    /// Maps a steering angle in degrees to a normalized command.
    fn steering_from_angle(&self, angle_deg: f64) -> f64 {
        // Deadband suppresses jitter around center.
        if angle_deg.abs() < self.steering_deadband_deg {
            return 0.0;
        }
        (angle_deg / self.max_steering_angle_deg).clamp(-1.0, 1.0)
    }
}
