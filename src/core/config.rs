use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::core::error::{AdasError, Result};

/// Multi-object tracker configuration.
///
/// All fields fall back to their defaults when absent from a JSON document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum center distance in pixels to accept a track match (default 120.0).
    pub association_distance_threshold_px: f64,
    /// Consecutive misses after which a track is deleted (default 5).
    pub max_missed_frames: u32,
    /// Pinhole calibration constant in pixels (default 35.0).
    pub focal_length_px: f64,
    /// Smallest box height used for distance estimation (default 1.0).
    pub min_box_height_px: f64,
    /// Range ceiling and degenerate-box sentinel in meters (default 200.0).
    pub max_distance_m: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            association_distance_threshold_px: 120.0,
            max_missed_frames: 5,
            focal_length_px: 35.0,
            min_box_height_px: 1.0,
            max_distance_m: 200.0,
        }
    }
}

impl TrackerConfig {
    /// Checks every field against its allowed range.
    ///
    /// # Returns
    ///
    /// `Ok(())` when all fields are in range, otherwise a `Configuration` error.
    pub fn validate(&self) -> Result<()> {
        ensure_range(
            "association_distance_threshold_px",
            self.association_distance_threshold_px,
            1.0,
            1000.0,
        )?;
        if !(1..=100).contains(&self.max_missed_frames) {
            return Err(AdasError::Configuration(format!(
                "max_missed_frames must be in [1, 100], got {}",
                self.max_missed_frames
            )));
        }
        ensure_range("focal_length_px", self.focal_length_px, 1.0, 1000.0)?;
        ensure_positive("min_box_height_px", self.min_box_height_px)?;
        ensure_positive("max_distance_m", self.max_distance_m)?;
        Ok(())
    }
}

/// Behavior planner configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Cruise speed in m/s with no lead vehicle (default 15.0, ~54 km/h).
    pub cruise_speed_mps: f64,
    /// Floor of the following threshold in meters (default 12.0).
    pub min_follow_distance_m: f64,
    /// Desired time gap to the lead vehicle in seconds (default 2.0).
    pub time_gap_s: f64,
    /// Proportional gain from lane offset to steering (default 1.0).
    pub lane_center_gain: f64,
    /// Maximum steering angle in degrees; the synthesizer and safety monitor
    /// normalize against this same value (default 22.0).
    pub max_steering_angle_deg: f64,
    /// Half-width of the in-path corridor as a fraction of the frame width
    /// (default 0.18).
    pub lane_membership_ratio: f64,
    /// Camera frame width in pixels (default 1280.0).
    pub frame_width_px: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            cruise_speed_mps: 15.0,
            min_follow_distance_m: 12.0,
            time_gap_s: 2.0,
            lane_center_gain: 1.0,
            max_steering_angle_deg: 22.0,
            lane_membership_ratio: 0.18,
            frame_width_px: 1280.0,
        }
    }
}

impl PlannerConfig {
    /// Checks every field against its allowed range.
    ///
    /// # Returns
    ///
    /// `Ok(())` when all fields are in range, otherwise a `Configuration` error.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("cruise_speed_mps", self.cruise_speed_mps)?;
        ensure_range("cruise_speed_mps", self.cruise_speed_mps, 0.0, 50.0)?;
        ensure_positive("min_follow_distance_m", self.min_follow_distance_m)?;
        ensure_range("min_follow_distance_m", self.min_follow_distance_m, 0.0, 100.0)?;
        ensure_range("time_gap_s", self.time_gap_s, 0.5, 5.0)?;
        ensure_positive("lane_center_gain", self.lane_center_gain)?;
        ensure_positive("max_steering_angle_deg", self.max_steering_angle_deg)?;
        ensure_range("max_steering_angle_deg", self.max_steering_angle_deg, 0.0, 45.0)?;
        ensure_positive("lane_membership_ratio", self.lane_membership_ratio)?;
        ensure_range("lane_membership_ratio", self.lane_membership_ratio, 0.0, 0.5)?;
        ensure_positive("frame_width_px", self.frame_width_px)?;
        Ok(())
    }
}

/// Command synthesizer configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Proportional gain from speed error to throttle/brake (default 0.15).
    pub speed_gain: f64,
    /// Steering magnitudes below this many degrees map to zero (default 0.5).
    pub steering_deadband_deg: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            speed_gain: 0.15,
            steering_deadband_deg: 0.5,
        }
    }
}

impl ControllerConfig {
    /// Checks every field against its allowed range.
    ///
    /// # Returns
    ///
    /// `Ok(())` when all fields are in range, otherwise a `Configuration` error.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("speed_gain", self.speed_gain)?;
        ensure_range("speed_gain", self.speed_gain, 0.0, 10.0)?;
        ensure_range("steering_deadband_deg", self.steering_deadband_deg, 0.0, 10.0)?;
        Ok(())
    }
}

/// Safety monitor limits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Absolute target-speed cap in m/s (default 33.0, ~120 km/h).
    pub max_speed_mps: f64,
    /// Maximum speed increase rate in m/s^2 (default 3.0).
    pub max_acceleration_mps2: f64,
    /// Maximum speed decrease rate in m/s^2 (default 8.0).
    pub max_deceleration_mps2: f64,
    /// Maximum steering change per control cycle in degrees (default 2.5).
    pub max_steering_rate_deg_per_cycle: f64,
    /// Range below which braking overrides everything, in meters (default 2.0).
    pub emergency_following_distance_m: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        SafetyConfig {
            max_speed_mps: 33.0,
            max_acceleration_mps2: 3.0,
            max_deceleration_mps2: 8.0,
            max_steering_rate_deg_per_cycle: 2.5,
            emergency_following_distance_m: 2.0,
        }
    }
}

impl SafetyConfig {
    /// Checks every field against its allowed range.
    ///
    /// # Returns
    ///
    /// `Ok(())` when all fields are in range, otherwise a `Configuration` error.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("max_speed_mps", self.max_speed_mps)?;
        ensure_range("max_speed_mps", self.max_speed_mps, 0.0, 100.0)?;
        ensure_positive("max_acceleration_mps2", self.max_acceleration_mps2)?;
        ensure_range("max_acceleration_mps2", self.max_acceleration_mps2, 0.0, 10.0)?;
        ensure_positive("max_deceleration_mps2", self.max_deceleration_mps2)?;
        ensure_range("max_deceleration_mps2", self.max_deceleration_mps2, 0.0, 15.0)?;
        ensure_positive(
            "max_steering_rate_deg_per_cycle",
            self.max_steering_rate_deg_per_cycle,
        )?;
        ensure_range(
            "max_steering_rate_deg_per_cycle",
            self.max_steering_rate_deg_per_cycle,
            0.0,
            45.0,
        )?;
        ensure_positive(
            "emergency_following_distance_m",
            self.emergency_following_distance_m,
        )?;
        ensure_range(
            "emergency_following_distance_m",
            self.emergency_following_distance_m,
            0.0,
            100.0,
        )?;
        Ok(())
    }
}

/// Complete runtime configuration for one pipeline instance.
///
/// Sections absent from a JSON document fall back to their defaults, so a
/// partial override like `{"planner": {"cruise_speed_mps": 20.0}}` is a valid
/// configuration.
///
/// # Examples
///
/// ```rust
/// use adas::core::config::RuntimeConfig;
///
/// let config = RuntimeConfig::default();
/// assert!(config.validate().is_ok());
///
/// let config = RuntimeConfig::from_json_str(
///     r#"{"planner": {"cruise_speed_mps": 20.0}, "fps": 10}"#,
/// )
/// .unwrap();
/// assert_eq!(config.planner.cruise_speed_mps, 20.0);
/// assert_eq!(config.planner.min_follow_distance_m, 12.0);
/// assert_eq!(config.frame_dt_s(), 0.1);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Tracker section.
    pub tracker: TrackerConfig,
    /// Planner section.
    pub planner: PlannerConfig,
    /// Controller section.
    pub controller: ControllerConfig,
    /// Safety section.
    pub safety: SafetyConfig,
    /// Frame rate the pipeline is driven at (default 20).
    pub fps: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            tracker: TrackerConfig::default(),
            planner: PlannerConfig::default(),
            controller: ControllerConfig::default(),
            safety: SafetyConfig::default(),
            fps: 20,
        }
    }
}

impl RuntimeConfig {
    /// Parses and validates a configuration from a JSON string.
    ///
    /// # Arguments
    ///
    /// * `payload` - JSON document; missing sections and fields use defaults.
    ///
    /// # Returns
    ///
    /// The validated configuration, or a `Configuration` error.
    pub fn from_json_str(payload: &str) -> Result<Self> {
        let config: RuntimeConfig = serde_json::from_str(payload)
            .map_err(|e| AdasError::Configuration(format!("invalid JSON config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON configuration file.
    ///
    /// # Returns
    ///
    /// The validated configuration, or a `Configuration` error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|e| {
            AdasError::Configuration(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        info!(path = %path.display(), "loading configuration");
        Self::from_json_str(&payload)
    }

    /// Checks every section and the frame rate.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the whole configuration is in range, otherwise a
    /// `Configuration` error.
    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;
        self.planner.validate()?;
        self.controller.validate()?;
        self.safety.validate()?;
        if !(1..=120).contains(&self.fps) {
            return Err(AdasError::Configuration(format!(
                "fps must be in [1, 120], got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Returns the frame period in seconds implied by `fps`.
    pub fn frame_dt_s(&self) -> f64 {
        1.0 / self.fps as f64
    }
}

fn ensure_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(AdasError::Configuration(format!(
            "{} must be finite, got {}",
            name, value
        )));
    }
    if value < min || value > max {
        return Err(AdasError::Configuration(format!(
            "{} must be in [{}, {}], got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AdasError::Configuration(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}
