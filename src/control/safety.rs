use serde::Serialize;
use tracing::warn;

use crate::control::controller::longitudinal_split;
use crate::core::config::SafetyConfig;
use crate::core::models::{ControlCommand, MotionPlan, Track};

/// Applies rate limiting to a new value based on the last value, down step,
/// and up step.
///
/// # Arguments
///
/// * `new_value` - The new value to be rate-limited.
/// * `last_value` - The last value before rate limiting.
/// * `dw_step` - The downward step for rate limiting, non-positive.
/// * `up_step` - The upward step for rate limiting, non-negative.
///
/// # Returns
///
/// The rate-limited value.
///
/// # Examples
///
/// ```rust
/// use adas::control::safety::rate_limit;
///
/// let limited = rate_limit(1.5, 1.0, -0.1, 0.2);
/// assert_eq!(limited, 1.2);
/// ```
pub fn rate_limit(new_value: f64, last_value: f64, dw_step: f64, up_step: f64) -> f64 {
    new_value
        .max(last_value + dw_step)
        .min(last_value + up_step)
}

/// Represents the cross-frame state of the safety monitor.
///
/// Threaded explicitly through [`SafetyMonitor::enforce`] and returned
/// updated alongside the command; the monitor itself holds no mutable state.
/// The fields carry the **realized** values of the previous cycle, so rate
/// limits are measured against what the vehicle was actually commanded, not
/// against a planned-but-overridden value.
///
/// # Examples
///
/// ```rust
/// use adas::control::safety::SafetyState;
///
/// let state = SafetyState::new();
/// assert_eq!(state.last_speed_mps, 0.0);
/// assert_eq!(state.last_steering_cmd, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafetyState {
    /// Speed the released command was driving toward last cycle, in m/s.
    pub last_speed_mps: f64,
    /// Normalized steering released last cycle.
    pub last_steering_cmd: f64,
}

impl SafetyState {
    /// Creates a new `SafetyState` instance at rest.
    ///
    /// # Returns
    ///
    /// A new zeroed `SafetyState` instance.
    pub fn new() -> Self {
        Self {
            last_speed_mps: 0.0,
            last_steering_cmd: 0.0,
        }
    }
}

impl Default for SafetyState {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies which guard produced a [`SafetyEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SafetyEventKind {
    /// A non-finite value reached the monitor; the conservative command was
    /// substituted wholesale.
    NonFiniteInput,
    /// The plan target exceeded the absolute speed cap.
    SpeedCapped,
    /// The requested speed step exceeded the acceleration limit.
    AccelerationLimited,
    /// The requested speed step exceeded the deceleration limit.
    DecelerationLimited,
    /// The steering step exceeded the per-cycle rate limit.
    SteeringRateLimited,
    /// A track closed inside the emergency following distance.
    EmergencyBrake,
    /// Final sanitization corrected the command ranges or channel exclusion.
    CommandSanitized,
}

/// Represents one clamp or override applied by the safety monitor.
///
/// Every correction is reported, never silent; the magnitude is expressed in
/// the guard's own unit (m/s, m/s², degrees, meters, or summed command
/// correction) and is `0.0` where no meaningful size exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyEvent {
    /// Guard that fired.
    pub kind: SafetyEventKind,
    /// Size of the correction in the guard's unit.
    pub magnitude: f64,
}

impl SafetyEvent {
    /// Creates a new `SafetyEvent` instance.
    ///
    /// # Arguments
    ///
    /// * `kind` - Guard that fired.
    /// * `magnitude` - Size of the correction in the guard's unit.
    ///
    /// # Returns
    ///
    /// A new `SafetyEvent` instance.
    pub fn new(kind: SafetyEventKind, magnitude: f64) -> Self {
        Self { kind, magnitude }
    }
}

/// Represents the final authority between synthesis and the vehicle.
///
/// Runs a fixed sequence of guards over every command: non-finite rejection,
/// absolute speed cap, acceleration/deceleration rate limits, steering rate
/// limit, emergency following-distance override, and final sanitization.
/// Guards clamp rather than fail; `enforce` never returns an error, and every
/// correction surfaces as a [`SafetyEvent`].
///
/// # Examples
///
/// ```rust
/// use adas::control::safety::{SafetyMonitor, SafetyState};
/// use adas::core::config::SafetyConfig;
/// use adas::core::models::{ControlCommand, MotionPlan};
///
/// let monitor = SafetyMonitor::new(SafetyConfig::default(), 0.15, 22.0, 0.05);
/// let plan = MotionPlan::new(10.0, 0.0, "cruise|no-lane");
/// let cmd = ControlCommand::new(0.0, 0.0, 0.0);
/// let state = SafetyState {
///     last_speed_mps: 10.0,
///     last_steering_cmd: 0.0,
/// };
///
/// let (safe_cmd, next_state, events) = monitor.enforce(&cmd, &plan, &[], 10.0, &state);
/// assert_eq!(safe_cmd, cmd);
/// assert_eq!(next_state, state);
/// assert!(events.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    limits: SafetyConfig,
    speed_gain: f64,
    max_steering_angle_deg: f64,
    cycle_dt_s: f64,
}

impl SafetyMonitor {
    /// Creates a new `SafetyMonitor` instance.
    ///
    /// # Arguments
    ///
    /// * `limits` - Vehicle-dynamics bounds to enforce.
    /// * `speed_gain` - Proportional gain used to re-derive throttle/brake
    ///   from a clamped target, matching the synthesizer.
    /// * `max_steering_angle_deg` - Physical maximum used to convert the
    ///   steering rate limit into normalized units.
    /// * `cycle_dt_s` - Control cycle period in seconds.
    ///
    /// # Returns
    ///
    /// A new `SafetyMonitor` instance.
    pub fn new(
        limits: SafetyConfig,
        speed_gain: f64,
        max_steering_angle_deg: f64,
        cycle_dt_s: f64,
    ) -> Self {
        Self {
            limits,
            speed_gain,
            max_steering_angle_deg,
            cycle_dt_s,
        }
    }

    /// Bounds a command against the vehicle-dynamics limits.
    ///
    /// # Arguments
    ///
    /// * `command` - Synthesized command to check.
    /// * `plan` - Plan the command realizes; its target anchors the speed
    ///   guards.
    /// * `tracks` - Live tracks, checked against the emergency distance.
    /// * `current_speed_mps` - Measured ego speed.
    /// * `state` - Realized values of the previous cycle.
    ///
    /// # Returns
    ///
    /// The bounded command, the updated state, and the events describing
    /// every correction applied (empty when the command passed untouched).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adas::control::safety::{SafetyEventKind, SafetyMonitor, SafetyState};
    /// use adas::core::config::SafetyConfig;
    /// use adas::core::models::{ControlCommand, MotionPlan};
    ///
    /// let monitor = SafetyMonitor::new(SafetyConfig::default(), 0.15, 22.0, 0.05);
    /// let plan = MotionPlan::new(40.0, 0.0, "cruise|no-lane");
    /// let cmd = ControlCommand::new(1.0, 0.0, 0.0);
    /// let state = SafetyState {
    ///     last_speed_mps: 33.0,
    ///     last_steering_cmd: 0.0,
    /// };
    ///
    /// let (_, _, events) = monitor.enforce(&cmd, &plan, &[], 33.0, &state);
    /// assert_eq!(events[0].kind, SafetyEventKind::SpeedCapped);
    /// ```
    pub fn enforce(
        &self,
        command: &ControlCommand,
        plan: &MotionPlan,
        tracks: &[Track],
        current_speed_mps: f64,
        state: &SafetyState,
    ) -> (ControlCommand, SafetyState, Vec<SafetyEvent>) {
        let inputs_finite = command.throttle.is_finite()
            && command.brake.is_finite()
            && command.steering.is_finite()
            && plan.target_speed_mps.is_finite()
            && plan.steering_angle_deg.is_finite()
            && current_speed_mps.is_finite()
            && state.last_speed_mps.is_finite()
            && state.last_steering_cmd.is_finite();
        if !inputs_finite {
            warn!("non-finite input, substituting full stop");
            return (
                ControlCommand::full_stop(),
                SafetyState::new(),
                vec![SafetyEvent::new(SafetyEventKind::NonFiniteInput, 0.0)],
            );
        }

        let mut events = Vec::new();
        let mut throttle = command.throttle;
        let mut brake = command.brake;
        let mut steering = command.steering;
        let mut target = plan.target_speed_mps;

        // Absolute speed cap.
        if target > self.limits.max_speed_mps {
            let excess = target - self.limits.max_speed_mps;
            target = self.limits.max_speed_mps;
            let (t, b) = longitudinal_split(target, current_speed_mps, self.speed_gain);
            throttle = t;
            brake = b;
            events.push(SafetyEvent::new(SafetyEventKind::SpeedCapped, excess));
            warn!(excess_mps = excess, "target speed capped");
        }

        // Rate limits are measured against the previously realized speed.
        let up_step = self.limits.max_acceleration_mps2 * self.cycle_dt_s;
        let dw_step = -self.limits.max_deceleration_mps2 * self.cycle_dt_s;
        let limited = rate_limit(target, state.last_speed_mps, dw_step, up_step);
        if limited < target {
            let excess = (target - state.last_speed_mps) / self.cycle_dt_s
                - self.limits.max_acceleration_mps2;
            events.push(SafetyEvent::new(
                SafetyEventKind::AccelerationLimited,
                excess,
            ));
            warn!(excess_mps2 = excess, "acceleration limited");
        } else if limited > target {
            let excess = (state.last_speed_mps - target) / self.cycle_dt_s
                - self.limits.max_deceleration_mps2;
            events.push(SafetyEvent::new(
                SafetyEventKind::DecelerationLimited,
                excess,
            ));
            warn!(excess_mps2 = excess, "deceleration limited");
        }
        if limited != target {
            target = limited;
            let (t, b) = longitudinal_split(target, current_speed_mps, self.speed_gain);
            throttle = t;
            brake = b;
        }

        // Steering rate limit, expressed in normalized units per cycle.
        let steering_step = self.limits.max_steering_rate_deg_per_cycle / self.max_steering_angle_deg;
        let limited_steering =
            rate_limit(steering, state.last_steering_cmd, -steering_step, steering_step);
        if limited_steering != steering {
            let curtailed_deg = (steering - limited_steering).abs() * self.max_steering_angle_deg;
            events.push(SafetyEvent::new(
                SafetyEventKind::SteeringRateLimited,
                curtailed_deg,
            ));
            warn!(curtailed_deg, "steering rate limited");
            steering = limited_steering;
        }

        // Emergency following distance supersedes the longitudinal channels;
        // steering stays under lateral control.
        let mut nearest_violation = f64::INFINITY;
        for track in tracks {
            if track.distance_m < self.limits.emergency_following_distance_m
                && track.distance_m < nearest_violation
            {
                nearest_violation = track.distance_m;
            }
        }
        let emergency = nearest_violation.is_finite();
        if emergency {
            throttle = 0.0;
            brake = 1.0;
            let shortfall = self.limits.emergency_following_distance_m - nearest_violation;
            events.push(SafetyEvent::new(SafetyEventKind::EmergencyBrake, shortfall));
            warn!(
                distance_m = nearest_violation,
                shortfall_m = shortfall,
                "emergency braking engaged"
            );
        }

        // Final sanitization re-asserts ranges and channel exclusion.
        let clamped_throttle = throttle.clamp(0.0, 1.0);
        let clamped_brake = brake.clamp(0.0, 1.0);
        let clamped_steering = steering.clamp(-1.0, 1.0);
        let mut correction = (clamped_throttle - throttle).abs()
            + (clamped_brake - brake).abs()
            + (clamped_steering - steering).abs();
        throttle = clamped_throttle;
        brake = clamped_brake;
        steering = clamped_steering;
        if throttle > 0.0 && brake > 0.0 {
            if throttle >= brake {
                correction += brake;
                brake = 0.0;
            } else {
                correction += throttle;
                throttle = 0.0;
            }
        }
        if correction > 0.0 {
            events.push(SafetyEvent::new(
                SafetyEventKind::CommandSanitized,
                correction,
            ));
            warn!(correction, "command sanitized");
        }

        let realized_speed = if emergency { 0.0 } else { target };
        let next_state = SafetyState {
            last_speed_mps: realized_speed,
            last_steering_cmd: steering,
        };
        (
            ControlCommand::new(throttle, brake, steering),
            next_state,
            events,
        )
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;

    #[test]
    fn test_rate_limit_caps_upward_step() {
        let limited = rate_limit(1.5, 1.0, -0.1, 0.2);
        assert!((limited - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rate_limit_caps_downward_step() {
        let limited = rate_limit(0.5, 1.0, -0.1, 0.2);
        assert!((limited - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rate_limit_passes_small_steps() {
        let limited = rate_limit(1.05, 1.0, -0.1, 0.2);
        assert!((limited - 1.05).abs() < f64::EPSILON);
    }
}
