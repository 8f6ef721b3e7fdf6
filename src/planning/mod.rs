use interp::interp;
use ndarray::Array1;
use tracing::{debug, warn};

use crate::core::config::PlannerConfig;
use crate::core::error::{AdasError, Result};
use crate::core::models::{LaneModel, MotionPlan, Track};
use crate::core::validation::{validate_lane_model, validate_motion_plan};

/// Recovery distance as a multiple of the following threshold.
const FOLLOW_RECOVERY_RATIO: f64 = 1.5;

/// Range rate in m/s below which a lead counts as closing fast.
const CLOSING_FAST_RATE_MPS: f64 = -0.5;

/// Calculates the lookahead distance based on ego speed.
///
/// # Arguments
///
/// * `v_ego` - Ego vehicle speed in m/s.
///
/// # Returns
///
/// The lookahead distance in meters.
///
/// # Examples
///
/// ```rust
/// use adas::planning::lookahead_distance;
///
/// let d_lookahead = lookahead_distance(25.0);
/// assert!(d_lookahead > 1.0);
/// ```
pub fn lookahead_distance(v_ego: f64) -> f64 {
    let offset_lookahead = 1.0;
    let coeff_lookahead = 4.4;
    offset_lookahead + (v_ego.max(0.0)).sqrt() * coeff_lookahead
}

/// Evaluates a polynomial with coefficients in ascending powers.
///
/// # Arguments
///
/// * `coeffs` - Polynomial coefficients, lowest order first.
/// * `x` - Evaluation point.
///
/// # Returns
///
/// The polynomial value at `x`.
///
/// # Examples
///
/// ```rust
/// use adas::planning::polyval;
/// use ndarray::arr1;
///
/// let coeffs = arr1(&[1.0, 0.0, 2.0]);
/// assert_eq!(polyval(&coeffs, 3.0), 19.0);
/// ```
pub fn polyval(coeffs: &Array1<f64>, x: f64) -> f64 {
    coeffs
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, &coeff)| acc + coeff * x.powi(i as i32))
}

/// Represents the adaptive-cruise and lane-centering policy.
///
/// Pure and stateless: `decide` is a function of the tracks, the lane, and
/// the current speed, so replaying the same inputs yields the same plan.
/// Degraded perception (no lane, no tracks) produces a conservative plan,
/// never an error; contradictory inputs (non-finite values, negative ranges)
/// are planning errors and fatal for the frame.
///
/// # Examples
///
/// ```rust
/// use adas::core::config::PlannerConfig;
/// use adas::planning::BehaviorPlanner;
///
/// let planner = BehaviorPlanner::new(&PlannerConfig::default());
/// let plan = planner.decide(&[], None, 10.0).unwrap();
/// assert_eq!(plan.target_speed_mps, 15.0);
/// assert_eq!(plan.steering_angle_deg, 0.0);
/// assert_eq!(plan.reason, "cruise|no-lane");
/// ```
#[derive(Debug, Clone)]
pub struct BehaviorPlanner {
    cruise_speed_mps: f64,
    min_follow_distance_m: f64,
    time_gap_s: f64,
    lane_center_gain: f64,
    max_steering_angle_deg: f64,
    lane_membership_ratio: f64,
    frame_width_px: f64,
}

impl BehaviorPlanner {
    /// Creates a new `BehaviorPlanner` instance.
    ///
    /// # Arguments
    ///
    /// * `config` - Planner policy parameters.
    ///
    /// # Returns
    ///
    /// A new `BehaviorPlanner` instance.
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            cruise_speed_mps: config.cruise_speed_mps,
            min_follow_distance_m: config.min_follow_distance_m,
            time_gap_s: config.time_gap_s,
            lane_center_gain: config.lane_center_gain,
            max_steering_angle_deg: config.max_steering_angle_deg,
            lane_membership_ratio: config.lane_membership_ratio,
            frame_width_px: config.frame_width_px,
        }
    }

    /// Returns the configured maximum steering angle in degrees.
    pub fn max_steering_angle_deg(&self) -> f64 {
        self.max_steering_angle_deg
    }

    /// Derives the motion intention for one frame.
    ///
    /// # Arguments
    ///
    /// * `tracks` - Live tracks from the tracker, ascending id order.
    /// * `lane` - Lane geometry, absent when none was detected.
    /// * `current_speed_mps` - Measured ego speed; negative values are
    ///   accepted as given.
    ///
    /// # Returns
    ///
    /// The validated motion plan, or a `Planning` error on contradictory
    /// inputs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adas::core::config::PlannerConfig;
    /// use adas::core::models::LaneModel;
    /// use adas::planning::BehaviorPlanner;
    ///
    /// let planner = BehaviorPlanner::new(&PlannerConfig::default());
    /// let lane = LaneModel::new(0.1);
    /// let plan = planner.decide(&[], Some(&lane), 12.0).unwrap();
    /// assert!(plan.steering_angle_deg > 0.0);
    /// assert_eq!(plan.reason, "cruise|lane-centering");
    /// ```
    pub fn decide(
        &self,
        tracks: &[Track],
        lane: Option<&LaneModel>,
        current_speed_mps: f64,
    ) -> Result<MotionPlan> {
        if !current_speed_mps.is_finite() {
            return Err(AdasError::Planning(format!(
                "non-finite current speed: {current_speed_mps}"
            )));
        }
        for track in tracks {
            if !track.distance_m.is_finite() || track.distance_m < 0.0 {
                return Err(AdasError::Planning(format!(
                    "track {} carries invalid distance {}",
                    track.id, track.distance_m
                )));
            }
            if !track.velocity_mps.is_finite() {
                return Err(AdasError::Planning(format!(
                    "track {} carries non-finite velocity",
                    track.id
                )));
            }
        }

        let (target_speed, speed_reason) = self.plan_speed(tracks, current_speed_mps);
        let (steering_deg, lane_reason) = self.plan_steering(lane, current_speed_mps);
        let reason = format!("{speed_reason}|{lane_reason}");

        let plan = MotionPlan::new(target_speed, steering_deg, &reason);
        validate_motion_plan(&plan)
            .map_err(|err| AdasError::Planning(format!("plan contradiction: {err}")))?;

        debug!(
            target_speed_mps = plan.target_speed_mps,
            steering_angle_deg = plan.steering_angle_deg,
            reason = %plan.reason,
            "plan produced"
        );
        Ok(plan)
    }

    /// Picks the closest in-path track, ties resolving to the lowest id.
    fn select_lead<'a>(&self, tracks: &'a [Track]) -> Option<&'a Track> {
        let half_width = self.frame_width_px / 2.0;
        let corridor_px = self.lane_membership_ratio * self.frame_width_px;
        tracks
            .iter()
            .filter(|track| {
                let (cx, _) = track.bbox.center();
                (cx - half_width).abs() <= corridor_px
            })
            .min_by(|a, b| {
                (a.distance_m, a.id)
                    .partial_cmp(&(b.distance_m, b.id))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Longitudinal policy: cruise, follow, or recover behind the lead.
    fn plan_speed(&self, tracks: &[Track], current_speed_mps: f64) -> (f64, &'static str) {
        let lead = match self.select_lead(tracks) {
            Some(lead) => lead,
            None => return (self.cruise_speed_mps, "cruise"),
        };

        let threshold_m = self
            .min_follow_distance_m
            .max(self.time_gap_s * current_speed_mps);
        let recovery_m = FOLLOW_RECOVERY_RATIO * threshold_m;

        if lead.distance_m >= recovery_m {
            return (self.cruise_speed_mps, "cruise-clear");
        }

        // Shrink toward 0 below the threshold, climb back to cruise across
        // the recovery band; the held speed anchors the breakpoint.
        let held = current_speed_mps.clamp(0.0, self.cruise_speed_mps);
        let distances = [0.0, threshold_m, recovery_m];
        let speeds = [0.0, held, self.cruise_speed_mps];
        let target = interp(&distances, &speeds, lead.distance_m);

        let reason = if lead.distance_m < threshold_m {
            if lead.velocity_mps < CLOSING_FAST_RATE_MPS {
                "closing-fast"
            } else {
                "following"
            }
        } else {
            "recovering"
        };
        (target, reason)
    }

    /// Lateral policy: center on the lane, hold straight when it is missing.
    fn plan_steering(&self, lane: Option<&LaneModel>, current_speed_mps: f64) -> (f64, &'static str) {
        let lane = match lane {
            Some(lane) => lane,
            None => return (0.0, "no-lane"),
        };

        if let Err(err) = validate_lane_model(lane) {
            warn!(%err, "lane model rejected, holding straight");
            return (0.0, "invalid-lane");
        }

        // How far we look ahead is a function of speed.
        let effective_offset = match &lane.curvature {
            Some(coeffs) => polyval(coeffs, lookahead_distance(current_speed_mps)),
            None => lane.center_offset,
        };

        let normalized = (self.lane_center_gain * effective_offset).clamp(-1.0, 1.0);
        (normalized * self.max_steering_angle_deg, "lane-centering")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::BoundingBox;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    fn track(id: u64, cx: f64, distance_m: f64, velocity_mps: f64) -> Track {
        Track {
            id,
            bbox: BoundingBox::new(cx - 30.0, 280.0, cx + 30.0, 320.0, 0.9, "vehicle"),
            distance_m,
            velocity_mps,
            age: 3,
            missed_frames: 0,
        }
    }

    fn planner() -> BehaviorPlanner {
        BehaviorPlanner::new(&PlannerConfig::default())
    }

    #[test]
    fn test_cruise_with_no_tracks_and_no_lane() {
        let plan = planner().decide(&[], None, 10.0).unwrap();
        assert_eq!(plan.target_speed_mps, 15.0);
        assert_eq!(plan.steering_angle_deg, 0.0);
        assert_eq!(plan.reason, "cruise|no-lane");
    }

    #[test]
    fn test_following_interpolates_toward_held_speed() {
        // current 10 -> threshold max(12, 20) = 20 m; lead at 10 m is half way.
        let tracks = vec![track(1, 640.0, 10.0, 0.0)];
        let plan = planner().decide(&tracks, None, 10.0).unwrap();
        assert_abs_diff_eq!(plan.target_speed_mps, 5.0, epsilon = 1e-9);
        assert!(plan.reason.starts_with("following"));
    }

    #[test]
    fn test_recovery_band_climbs_back_to_cruise() {
        // current 10 -> threshold 20 m, recovery 30 m; lead at 25 m.
        let tracks = vec![track(1, 640.0, 25.0, 0.0)];
        let plan = planner().decide(&tracks, None, 10.0).unwrap();
        let expected = 10.0 + (25.0 - 20.0) / (30.0 - 20.0) * (15.0 - 10.0);
        assert_abs_diff_eq!(plan.target_speed_mps, expected, epsilon = 1e-9);
        assert!(plan.reason.starts_with("recovering"));
    }

    #[test]
    fn test_clear_lead_restores_cruise() {
        let tracks = vec![track(1, 640.0, 80.0, 0.0)];
        let plan = planner().decide(&tracks, None, 10.0).unwrap();
        assert_eq!(plan.target_speed_mps, 15.0);
        assert!(plan.reason.starts_with("cruise-clear"));
    }

    #[test]
    fn test_acc_targets_move_toward_cruise() {
        let tracks = vec![track(1, 640.0, 20.0, 0.0)];
        let planner = planner();

        let fast = planner.decide(&tracks, None, 8.0).unwrap();
        let slow = planner.decide(&tracks, None, 5.0).unwrap();

        // Targets stay between current and cruise, never beyond either.
        assert!(fast.target_speed_mps >= 8.0 && fast.target_speed_mps <= 15.0);
        assert!(slow.target_speed_mps >= 5.0 && slow.target_speed_mps <= 15.0);
        assert!(slow.target_speed_mps >= fast.target_speed_mps);
    }

    #[test]
    fn test_closing_fast_reason() {
        let tracks = vec![track(1, 640.0, 10.0, -3.0)];
        let plan = planner().decide(&tracks, None, 10.0).unwrap();
        assert!(plan.reason.starts_with("closing-fast"));
    }

    #[test]
    fn test_out_of_path_track_ignored() {
        // Corridor with defaults: |cx - 640| <= 230.4 px.
        let tracks = vec![track(1, 100.0, 8.0, 0.0)];
        let plan = planner().decide(&tracks, None, 10.0).unwrap();
        assert_eq!(plan.target_speed_mps, 15.0);
        assert!(plan.reason.starts_with("cruise|"));
    }

    #[test]
    fn test_lead_ties_resolve_to_lowest_id() {
        let tracks = vec![track(1, 600.0, 10.0, -3.0), track(2, 680.0, 10.0, 0.0)];
        let plan = planner().decide(&tracks, None, 10.0).unwrap();
        // Only track 1 is closing fast; the reason proves it was selected.
        assert!(plan.reason.starts_with("closing-fast"));
    }

    #[test]
    fn test_lane_centering_steers_toward_center() {
        let lane = LaneModel::new(0.1);
        let plan = planner().decide(&[], Some(&lane), 12.0).unwrap();
        assert_abs_diff_eq!(plan.steering_angle_deg, 0.1 * 22.0, epsilon = 1e-9);
        assert_eq!(plan.reason, "cruise|lane-centering");
    }

    #[test]
    fn test_curvature_evaluated_at_lookahead() {
        let coeffs = arr1(&[0.05, 0.001]);
        let lane = LaneModel::with_curvature(0.0, coeffs.clone());
        let current = 9.0;
        let plan = planner().decide(&[], Some(&lane), current).unwrap();

        let expected_offset = polyval(&coeffs, lookahead_distance(current));
        assert_abs_diff_eq!(
            plan.steering_angle_deg,
            expected_offset.clamp(-1.0, 1.0) * 22.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_large_offset_saturates_at_max_angle() {
        let lane = LaneModel::new(3.0);
        let plan = planner().decide(&[], Some(&lane), 12.0).unwrap();
        assert_abs_diff_eq!(plan.steering_angle_deg, 22.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_lane_degrades_not_fails() {
        let lane = LaneModel::new(f64::NAN);
        let plan = planner().decide(&[], Some(&lane), 12.0).unwrap();
        assert_eq!(plan.steering_angle_deg, 0.0);
        assert_eq!(plan.reason, "cruise|invalid-lane");
    }

    #[test]
    fn test_invalid_track_distance_is_fatal() {
        let tracks = vec![track(1, 640.0, -4.0, 0.0)];
        let err = planner().decide(&tracks, None, 10.0).unwrap_err();
        assert!(matches!(err, AdasError::Planning(_)));
    }

    #[test]
    fn test_non_finite_current_speed_is_fatal() {
        let err = planner().decide(&[], None, f64::NAN).unwrap_err();
        assert!(matches!(err, AdasError::Planning(_)));
    }

    #[test]
    fn test_negative_current_speed_accepted() {
        let plan = planner().decide(&[], None, -1.0).unwrap();
        assert_eq!(plan.target_speed_mps, 15.0);
    }

    #[test]
    fn test_stationary_ego_holds_zero_below_threshold() {
        // current 0 -> threshold 12 m (the configured floor); lead at 6 m.
        let tracks = vec![track(1, 640.0, 6.0, 0.0)];
        let plan = planner().decide(&tracks, None, 0.0).unwrap();
        assert_abs_diff_eq!(plan.target_speed_mps, 0.0, epsilon = 1e-9);
    }
}
