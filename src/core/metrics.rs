use serde::Serialize;

/// Represents counters accumulated by one pipeline instance.
///
/// The core is single-threaded by contract, so these are plain integers
/// rather than atomics; the owning pipeline updates them once per frame.
///
/// # Examples
///
/// ```rust
/// use adas::core::metrics::PipelineMetrics;
///
/// let mut metrics = PipelineMetrics::default();
/// metrics.record_frame(2, 0, 2, true);
/// metrics.record_frame(1, 1, 2, false);
/// assert_eq!(metrics.total_frames, 2);
/// assert_eq!(metrics.lane_detection_rate(), 50.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineMetrics {
    /// Frames processed to completion or aborted mid-frame.
    pub total_frames: u64,
    /// Detections handed to the tracker, including rejected ones.
    pub total_detections: u64,
    /// Detections dropped by per-item validation.
    pub rejected_detections: u64,
    /// Live tracks summed over frames.
    pub total_tracks: u64,
    /// Frames that carried lane geometry.
    pub frames_with_lane: u64,
    /// Frames where perception failed and empty inputs were substituted.
    pub perception_failures: u64,
    /// Frames aborted by a planning or synthesis error.
    pub planning_failures: u64,
    /// Safety clamps and overrides reported by the monitor.
    pub safety_events: u64,
    /// Frames where the emergency braking override fired.
    pub emergency_overrides: u64,
}

impl PipelineMetrics {
    /// Accumulates the per-frame counts.
    ///
    /// # Arguments
    ///
    /// * `detections` - Detections handed to the tracker this frame.
    /// * `rejected` - Detections dropped by validation this frame.
    /// * `tracks` - Live tracks after this frame's update.
    /// * `has_lane` - Whether the frame carried lane geometry.
    pub fn record_frame(&mut self, detections: u64, rejected: u64, tracks: u64, has_lane: bool) {
        self.total_frames += 1;
        self.total_detections += detections;
        self.rejected_detections += rejected;
        self.total_tracks += tracks;
        if has_lane {
            self.frames_with_lane += 1;
        }
    }

    /// Accumulates one substituted perception failure.
    pub fn record_perception_failure(&mut self) {
        self.perception_failures += 1;
    }

    /// Accumulates one fatal planning/synthesis frame.
    pub fn record_planning_failure(&mut self) {
        self.planning_failures += 1;
    }

    /// Accumulates the safety events reported for one frame.
    ///
    /// # Arguments
    ///
    /// * `events` - Number of clamp/override events this frame.
    /// * `emergencies` - Number of emergency braking overrides among them.
    pub fn record_safety_events(&mut self, events: u64, emergencies: u64) {
        self.safety_events += events;
        self.emergency_overrides += emergencies;
    }

    /// Returns the percentage of frames that carried lane geometry.
    pub fn lane_detection_rate(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.frames_with_lane as f64 / self.total_frames as f64 * 100.0
    }

    /// Returns the mean number of live tracks per frame.
    pub fn mean_tracks_per_frame(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.total_tracks as f64 / self.total_frames as f64
    }

    /// Produces a serializable snapshot for telemetry export.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adas::core::metrics::PipelineMetrics;
    ///
    /// let mut metrics = PipelineMetrics::default();
    /// metrics.record_frame(1, 0, 1, true);
    /// let json = serde_json::to_string(&metrics.summary()).unwrap();
    /// assert!(json.contains("\"total_frames\":1"));
    /// ```
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            total_detections: self.total_detections,
            rejected_detections: self.rejected_detections,
            mean_tracks_per_frame: self.mean_tracks_per_frame(),
            lane_detection_rate: self.lane_detection_rate(),
            perception_failures: self.perception_failures,
            planning_failures: self.planning_failures,
            safety_events: self.safety_events,
            emergency_overrides: self.emergency_overrides,
        }
    }
}

/// Represents a point-in-time metrics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    /// Frames processed.
    pub total_frames: u64,
    /// Detections handed to the tracker.
    pub total_detections: u64,
    /// Detections dropped by validation.
    pub rejected_detections: u64,
    /// Mean live tracks per frame.
    pub mean_tracks_per_frame: f64,
    /// Percentage of frames with lane geometry.
    pub lane_detection_rate: f64,
    /// Substituted perception failures.
    pub perception_failures: u64,
    /// Fatal planning/synthesis frames.
    pub planning_failures: u64,
    /// Safety clamps and overrides.
    pub safety_events: u64,
    /// Emergency braking overrides.
    pub emergency_overrides: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_frame_accumulation() {
        let mut metrics = PipelineMetrics::default();
        metrics.record_frame(3, 1, 2, true);
        metrics.record_frame(0, 0, 2, false);
        metrics.record_frame(1, 0, 3, true);

        assert_eq!(metrics.total_frames, 3);
        assert_eq!(metrics.total_detections, 4);
        assert_eq!(metrics.rejected_detections, 1);
        assert_eq!(metrics.total_tracks, 7);
        assert_eq!(metrics.frames_with_lane, 2);
    }

    #[test]
    fn test_rates() {
        let mut metrics = PipelineMetrics::default();
        assert_eq!(metrics.lane_detection_rate(), 0.0);
        assert_eq!(metrics.mean_tracks_per_frame(), 0.0);

        metrics.record_frame(1, 0, 1, true);
        metrics.record_frame(1, 0, 2, false);
        assert_abs_diff_eq!(metrics.lane_detection_rate(), 50.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.mean_tracks_per_frame(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_safety_event_counts() {
        let mut metrics = PipelineMetrics::default();
        metrics.record_safety_events(3, 1);
        metrics.record_safety_events(1, 0);
        assert_eq!(metrics.safety_events, 4);
        assert_eq!(metrics.emergency_overrides, 1);
    }

    #[test]
    fn test_summary_serializes() {
        let mut metrics = PipelineMetrics::default();
        metrics.record_frame(2, 0, 1, true);
        metrics.record_perception_failure();
        let summary = metrics.summary();
        assert_eq!(summary.perception_failures, 1);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"lane_detection_rate\":100.0"));
    }
}
