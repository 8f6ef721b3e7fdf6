use serde::Serialize;
use tracing::{info, warn};

use crate::core::error::Result;
use crate::core::models::FrameInput;
use crate::perception::{DetectionSource, LaneSource};
use crate::runtime::pipeline::Pipeline;

/// Speed gained per command unit per second by the simulated ego.
const SPEED_GAIN_MPS: f64 = 5.0;

/// Represents the result of one closed-loop run.
///
/// # Examples
///
/// ```rust
/// use adas::runtime::runner::RunSummary;
///
/// let summary = RunSummary {
///     frames_processed: 60,
///     final_speed_mps: 9.5,
///     perception_failures: 0,
///     safety_events: 12,
/// };
/// let json = serde_json::to_string(&summary).unwrap();
/// assert!(json.contains("\"frames_processed\":60"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Frames driven through the pipeline.
    pub frames_processed: u64,
    /// Simulated ego speed after the last frame, in m/s.
    pub final_speed_mps: f64,
    /// Source failures substituted with empty perception during this run.
    pub perception_failures: u64,
    /// Safety corrections reported during this run.
    pub safety_events: u64,
}

/// Represents a closed-loop frame driver over the pipeline.
///
/// Polls a [`DetectionSource`] and a [`LaneSource`] once per frame, steps the
/// pipeline, and integrates the released command into a simulated ego speed.
/// A failing source is substituted with empty perception and the loop keeps
/// running; a planning or synthesis error aborts the run. Pacing is the
/// caller's concern; the runner never sleeps.
///
/// # Examples
///
/// ```rust
/// use adas::core::config::RuntimeConfig;
/// use adas::perception::{SyntheticDetectionSource, SyntheticLaneSource};
/// use adas::runtime::pipeline::Pipeline;
/// use adas::runtime::runner::PipelineRunner;
///
/// let config = RuntimeConfig::default();
/// let pipeline = Pipeline::from_config(&config).unwrap();
/// let mut runner = PipelineRunner::new(pipeline, config.frame_dt_s());
///
/// let mut detector = SyntheticDetectionSource::new(1280.0, 720.0);
/// let mut lanes = SyntheticLaneSource::new();
/// let summary = runner.run(&mut detector, &mut lanes, 10).unwrap();
/// assert_eq!(summary.frames_processed, 10);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    pipeline: Pipeline,
    frame_dt_s: f64,
    initial_speed_mps: f64,
}

impl PipelineRunner {
    /// Creates a new `PipelineRunner` instance starting from rest.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline to drive; the runner takes ownership.
    /// * `frame_dt_s` - Frame period in seconds, used for timestamps and
    ///   speed integration.
    ///
    /// # Returns
    ///
    /// A new `PipelineRunner` instance.
    pub fn new(pipeline: Pipeline, frame_dt_s: f64) -> Self {
        Self {
            pipeline,
            frame_dt_s,
            initial_speed_mps: 0.0,
        }
    }

    /// Sets the simulated ego speed at the start of each run.
    ///
    /// # Arguments
    ///
    /// * `speed_mps` - Initial speed in m/s.
    ///
    /// # Returns
    ///
    /// The runner with the initial speed applied.
    pub fn with_initial_speed(mut self, speed_mps: f64) -> Self {
        self.initial_speed_mps = speed_mps;
        self
    }

    /// Returns the driven pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Drives the closed loop for a number of frames.
    ///
    /// # Arguments
    ///
    /// * `detector` - Detection source polled once per frame.
    /// * `lanes` - Lane source polled once per frame.
    /// * `frames` - Number of frames to process.
    ///
    /// # Returns
    ///
    /// The run summary, or the first fatal frame error.
    pub fn run<D, L>(&mut self, detector: &mut D, lanes: &mut L, frames: u64) -> Result<RunSummary>
    where
        D: DetectionSource,
        L: LaneSource,
    {
        let mut speed_mps = self.initial_speed_mps;
        let mut perception_failures = 0u64;
        let mut safety_events = 0u64;

        for frame_id in 0..frames {
            let detections = match detector.detect(frame_id) {
                Ok(detections) => detections,
                Err(err) => {
                    warn!(frame_id, %err, "detector failed, substituting empty frame");
                    self.pipeline.record_perception_failure();
                    perception_failures += 1;
                    Vec::new()
                }
            };
            let lane = match lanes.estimate(frame_id) {
                Ok(lane) => lane,
                Err(err) => {
                    warn!(frame_id, %err, "lane estimator failed, substituting no lane");
                    self.pipeline.record_perception_failure();
                    perception_failures += 1;
                    None
                }
            };

            let timestamp_s = frame_id as f64 * self.frame_dt_s;
            let frame = FrameInput::new(frame_id, timestamp_s, detections, lane);
            let output = self.pipeline.step(&frame, speed_mps)?;
            safety_events += output.safety_events.len() as u64;

            // Simple integration of the released command into ego speed.
            let delta =
                (output.command.throttle - output.command.brake) * self.frame_dt_s * SPEED_GAIN_MPS;
            speed_mps = (speed_mps + delta).max(0.0);
        }

        let summary = RunSummary {
            frames_processed: frames,
            final_speed_mps: speed_mps,
            perception_failures,
            safety_events,
        };
        info!(
            frames = summary.frames_processed,
            final_speed_mps = summary.final_speed_mps,
            perception_failures = summary.perception_failures,
            "run completed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RuntimeConfig;
    use crate::core::error::AdasError;
    use crate::core::models::{BoundingBox, LaneModel};
    use crate::perception::{SyntheticDetectionSource, SyntheticLaneSource};

    struct FailingDetector;

    impl DetectionSource for FailingDetector {
        fn detect(&mut self, _frame_id: u64) -> Result<Vec<BoundingBox>> {
            Err(AdasError::PerceptionUnavailable("sensor offline".into()))
        }
    }

    struct FailingLanes;

    impl LaneSource for FailingLanes {
        fn estimate(&mut self, _frame_id: u64) -> Result<Option<LaneModel>> {
            Err(AdasError::PerceptionUnavailable("camera offline".into()))
        }
    }

    fn runner() -> PipelineRunner {
        let config = RuntimeConfig::default();
        let pipeline = Pipeline::from_config(&config).unwrap();
        PipelineRunner::new(pipeline, config.frame_dt_s())
    }

    #[test]
    fn test_open_road_ramps_up_from_rest() {
        let mut runner = runner();
        // Threshold above the synthetic confidence: every frame is empty road.
        let mut detector = SyntheticDetectionSource::new(1280.0, 720.0);
        detector.confidence_threshold = 0.9;
        let mut lanes = SyntheticLaneSource::new();

        let summary = runner.run(&mut detector, &mut lanes, 100).unwrap();
        assert_eq!(summary.frames_processed, 100);
        assert_eq!(summary.perception_failures, 0);
        assert!(summary.final_speed_mps > 1.0);
        assert_eq!(runner.pipeline().metrics().total_detections, 0);
    }

    #[test]
    fn test_close_lead_slows_the_ego() {
        let mut runner = runner().with_initial_speed(10.0);
        // Default geometry puts the synthetic lead well inside follow range.
        let mut detector = SyntheticDetectionSource::new(1280.0, 720.0);
        let mut lanes = SyntheticLaneSource::new();

        let summary = runner.run(&mut detector, &mut lanes, 40).unwrap();
        assert!(summary.final_speed_mps < 10.0);
        assert!(runner.pipeline().metrics().total_tracks > 0);
    }

    #[test]
    fn test_failing_sources_are_substituted_not_fatal() {
        let mut runner = runner();
        let mut detector = FailingDetector;
        let mut lanes = FailingLanes;

        let summary = runner.run(&mut detector, &mut lanes, 5).unwrap();
        assert_eq!(summary.frames_processed, 5);
        assert_eq!(summary.perception_failures, 10);
        assert_eq!(runner.pipeline().metrics().perception_failures, 10);

        // The loop still produced commands: the ego crept up toward cruise.
        assert!(summary.final_speed_mps > 0.0);
    }

    #[test]
    fn test_lane_dropout_degrades_gracefully() {
        let mut runner = runner();
        let mut detector = SyntheticDetectionSource::new(1280.0, 720.0);
        detector.confidence_threshold = 0.9;
        let mut lanes = SyntheticLaneSource::new().with_dropout_every(2);

        let summary = runner.run(&mut detector, &mut lanes, 10).unwrap();
        assert_eq!(summary.frames_processed, 10);
        assert_eq!(summary.perception_failures, 0);
        // Half the frames carried a lane.
        assert_eq!(runner.pipeline().metrics().frames_with_lane, 5);
    }
}
