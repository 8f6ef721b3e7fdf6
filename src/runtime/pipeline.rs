use tracing::debug;

use crate::control::controller::CommandSynthesizer;
use crate::control::safety::{SafetyEvent, SafetyEventKind, SafetyMonitor, SafetyState};
use crate::core::config::RuntimeConfig;
use crate::core::error::Result;
use crate::core::metrics::PipelineMetrics;
use crate::core::models::{ControlCommand, FrameInput, MotionPlan, Track};
use crate::planning::BehaviorPlanner;
use crate::tracking::MultiObjectTracker;

/// Represents the outcome of one pipeline step.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Motion intention for the frame.
    pub plan: MotionPlan,
    /// Bounded command released to the vehicle.
    pub command: ControlCommand,
    /// Live tracks after the frame's update, ascending id order.
    pub tracks: Vec<Track>,
    /// Corrections the safety monitor applied, in guard order.
    pub safety_events: Vec<SafetyEvent>,
}

/// Represents the per-frame orchestrator of the decision-and-control core.
///
/// Sequences tracking, planning, synthesis, and safety enforcement over one
/// frame of perception input. Owns the only mutable cross-frame state: the
/// track store, the threaded [`SafetyState`], the frame counter, and the
/// metrics. Single-threaded by contract; one frame completes before the next
/// begins.
///
/// Degraded perception (no detections, no lane) flows through as a
/// conservative plan. A planning or synthesis error is fatal for the frame
/// and propagates; the safety stage never fails.
///
/// # Examples
///
/// ```rust
/// use adas::core::config::RuntimeConfig;
/// use adas::core::models::FrameInput;
/// use adas::runtime::pipeline::Pipeline;
///
/// let mut pipeline = Pipeline::from_config(&RuntimeConfig::default()).unwrap();
/// let output = pipeline.step(&FrameInput::empty(0, 0.0), 0.0).unwrap();
/// assert_eq!(output.plan.target_speed_mps, 15.0);
/// assert!(output.tracks.is_empty());
/// assert!(output.command.throttle > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    tracker: MultiObjectTracker,
    planner: BehaviorPlanner,
    synthesizer: CommandSynthesizer,
    monitor: SafetyMonitor,
    safety_state: SafetyState,
    frame_count: u64,
    metrics: PipelineMetrics,
}

impl Pipeline {
    /// Builds a pipeline from a validated runtime configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Runtime configuration; validated before any component is
    ///   constructed.
    ///
    /// # Returns
    ///
    /// The assembled pipeline, or a `Configuration` error.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        config.validate()?;
        let frame_dt_s = config.frame_dt_s();
        Ok(Self {
            tracker: MultiObjectTracker::new(&config.tracker, frame_dt_s),
            planner: BehaviorPlanner::new(&config.planner),
            synthesizer: CommandSynthesizer::new(
                config.controller.speed_gain,
                config.controller.steering_deadband_deg,
                config.planner.max_steering_angle_deg,
            ),
            monitor: SafetyMonitor::new(
                config.safety.clone(),
                config.controller.speed_gain,
                config.planner.max_steering_angle_deg,
                frame_dt_s,
            ),
            safety_state: SafetyState::new(),
            frame_count: 0,
            metrics: PipelineMetrics::default(),
        })
    }

    /// Processes one frame end to end.
    ///
    /// # Arguments
    ///
    /// * `frame` - Perception input for the frame.
    /// * `current_speed_mps` - Measured ego speed.
    ///
    /// # Returns
    ///
    /// The plan, released command, tracks, and safety events for the frame,
    /// or a `Planning`/`Control` error that aborts the frame (the tracker
    /// keeps the frame's detections either way).
    pub fn step(&mut self, frame: &FrameInput, current_speed_mps: f64) -> Result<StepOutput> {
        self.frame_count += 1;

        let rejected_before = self.tracker.rejected_detections();
        let tracks = self.tracker.update(&frame.detections);
        let rejected = self.tracker.rejected_detections() - rejected_before;
        self.metrics.record_frame(
            frame.detections.len() as u64,
            rejected,
            tracks.len() as u64,
            frame.lane.is_some(),
        );

        let plan = match self
            .planner
            .decide(&tracks, frame.lane.as_ref(), current_speed_mps)
        {
            Ok(plan) => plan,
            Err(err) => {
                self.metrics.record_planning_failure();
                return Err(err);
            }
        };
        let raw_command = match self.synthesizer.convert(&plan, current_speed_mps) {
            Ok(command) => command,
            Err(err) => {
                self.metrics.record_planning_failure();
                return Err(err);
            }
        };

        let (command, next_state, safety_events) = self.monitor.enforce(
            &raw_command,
            &plan,
            &tracks,
            current_speed_mps,
            &self.safety_state,
        );
        self.safety_state = next_state;

        let emergencies = safety_events
            .iter()
            .filter(|event| event.kind == SafetyEventKind::EmergencyBrake)
            .count() as u64;
        self.metrics
            .record_safety_events(safety_events.len() as u64, emergencies);

        debug!(
            frame_id = frame.frame_id,
            frame_count = self.frame_count,
            tracks = tracks.len(),
            reason = %plan.reason,
            throttle = command.throttle,
            brake = command.brake,
            steering = command.steering,
            "frame processed"
        );

        Ok(StepOutput {
            plan,
            command,
            tracks,
            safety_events,
        })
    }

    /// Accounts one substituted perception failure; called by the frame
    /// driver when it replaces failed sensor output with an empty frame.
    pub fn record_perception_failure(&mut self) {
        self.metrics.record_perception_failure();
    }

    /// Returns the accumulated metrics.
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Returns the number of frames handed to `step` since construction or
    /// the last reset.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Clears all cross-frame state: track store, safety state, frame
    /// counter, and metrics. The configuration is kept.
    pub fn reset(&mut self) {
        debug!("pipeline reset");
        self.tracker.reset();
        self.safety_state = SafetyState::new();
        self.frame_count = 0;
        self.metrics = PipelineMetrics::default();
    }
}
