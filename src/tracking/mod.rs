use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::common::filters::FirstOrderLowpassFilter;
use crate::core::config::TrackerConfig;
use crate::core::models::{BoundingBox, Track};
use crate::core::validation::validate_bounding_box;

/// Cutoff frequency of the per-track range-rate filter in Hertz.
const RANGE_RATE_CUTOFF_HZ: f64 = 1.0;

/// Internal per-track state; the public [`Track`] is a snapshot of this.
#[derive(Debug, Clone)]
struct TrackState {
    bbox: BoundingBox,
    distance_m: f64,
    velocity_mps: f64,
    age: u32,
    missed_frames: u32,
    range_rate: FirstOrderLowpassFilter,
}

/// Represents a greedy nearest-center multi-object tracker.
///
/// Associates per-frame detections to persistent tracks by bounding-box
/// center distance, estimates range from box height through a pinhole proxy,
/// and derives a smoothed signed range rate per track. Track ids are
/// allocated by this store and never reused within it; two stores allocate
/// independently.
///
/// Association is deterministic: tracks are visited in ascending id order,
/// each claiming the unassigned detection with the strictly smallest center
/// distance, so equidistant candidates resolve to the lowest id and the
/// lowest detection index.
///
/// # Examples
///
/// ```rust
/// use adas::core::config::TrackerConfig;
/// use adas::core::models::BoundingBox;
/// use adas::tracking::MultiObjectTracker;
///
/// let config = TrackerConfig::default();
/// let mut tracker = MultiObjectTracker::new(&config, 0.05);
///
/// let detections = vec![BoundingBox::new(600.0, 350.0, 680.0, 420.0, 0.9, "vehicle")];
/// let tracks = tracker.update(&detections);
/// assert_eq!(tracks.len(), 1);
/// assert_eq!(tracks[0].id, 1);
/// assert_eq!(tracks[0].velocity_mps, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct MultiObjectTracker {
    association_distance_threshold_px: f64,
    max_missed_frames: u32,
    focal_length_px: f64,
    min_box_height_px: f64,
    max_distance_m: f64,
    frame_dt_s: f64,
    next_track_id: u64,
    tracks: BTreeMap<u64, TrackState>,
    rejected_detections: u64,
}

impl MultiObjectTracker {
    /// Creates a new `MultiObjectTracker` instance.
    ///
    /// # Arguments
    ///
    /// * `config` - Tracker tuning parameters.
    /// * `frame_dt_s` - Nominal frame period in seconds, must be positive.
    ///
    /// # Returns
    ///
    /// A new `MultiObjectTracker` instance with an empty store and the id
    /// allocator at 1.
    pub fn new(config: &TrackerConfig, frame_dt_s: f64) -> Self {
        Self {
            association_distance_threshold_px: config.association_distance_threshold_px,
            max_missed_frames: config.max_missed_frames,
            focal_length_px: config.focal_length_px,
            min_box_height_px: config.min_box_height_px,
            max_distance_m: config.max_distance_m,
            frame_dt_s,
            next_track_id: 1,
            tracks: BTreeMap::new(),
            rejected_detections: 0,
        }
    }

    /// Advances the tracker by one frame of detections.
    ///
    /// Invalid detections are dropped individually (logged and counted), so
    /// one bad box never stalls tracking of the rest. Matched tracks take the
    /// detection's box and a fresh distance/velocity estimate; unmatched
    /// tracks accrue a missed frame and are deleted once they exceed the
    /// configured miss budget. Leftover detections spawn new tracks with
    /// zero velocity.
    ///
    /// # Arguments
    ///
    /// * `detections` - Detections for this frame, validated per item.
    ///
    /// # Returns
    ///
    /// The live tracks after the update, in ascending id order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adas::core::config::TrackerConfig;
    /// use adas::core::models::BoundingBox;
    /// use adas::tracking::MultiObjectTracker;
    ///
    /// let mut tracker = MultiObjectTracker::new(&TrackerConfig::default(), 0.05);
    /// let first = tracker.update(&[BoundingBox::new(100.0, 100.0, 150.0, 160.0, 0.9, "vehicle")]);
    /// let second = tracker.update(&[BoundingBox::new(102.0, 100.0, 152.0, 160.0, 0.9, "vehicle")]);
    /// assert_eq!(first[0].id, second[0].id);
    /// ```
    pub fn update(&mut self, detections: &[BoundingBox]) -> Vec<Track> {
        let mut valid: Vec<&BoundingBox> = Vec::with_capacity(detections.len());
        for detection in detections {
            match validate_bounding_box(detection) {
                Ok(()) => valid.push(detection),
                Err(err) => {
                    self.rejected_detections += 1;
                    warn!(%err, "detection rejected");
                }
            }
        }

        // Distances are derived up front; the association loop holds a
        // mutable borrow of the store.
        let distances: Vec<f64> = valid.iter().map(|det| self.estimate_distance(det)).collect();
        let frame_dt_s = self.frame_dt_s;
        let threshold = self.association_distance_threshold_px;
        let mut assigned = vec![false; valid.len()];

        for (&id, state) in self.tracks.iter_mut() {
            let (tx, ty) = state.bbox.center();

            let mut best_idx: Option<usize> = None;
            let mut best_dist = f64::INFINITY;
            for (idx, detection) in valid.iter().enumerate() {
                if assigned[idx] {
                    continue;
                }
                let (dx, dy) = detection.center();
                let dist = (dx - tx).hypot(dy - ty);
                if dist < best_dist {
                    best_dist = dist;
                    best_idx = Some(idx);
                }
            }

            match best_idx {
                Some(idx) if best_dist < threshold => {
                    assigned[idx] = true;
                    // Distance deltas span the frames the track went unseen.
                    let elapsed_s = frame_dt_s * f64::from(state.missed_frames + 1);
                    let raw_rate = (distances[idx] - state.distance_m) / elapsed_s;
                    state.velocity_mps = state.range_rate.apply(raw_rate);
                    state.bbox = valid[idx].clone();
                    state.distance_m = distances[idx];
                    state.missed_frames = 0;
                    state.age += 1;
                    debug!(
                        track_id = id,
                        distance_px = best_dist,
                        "track associated"
                    );
                }
                _ => {
                    state.missed_frames += 1;
                    state.age += 1;
                }
            }
        }

        let max_missed = self.max_missed_frames;
        self.tracks.retain(|&id, state| {
            let keep = state.missed_frames <= max_missed;
            if !keep {
                debug!(track_id = id, missed = state.missed_frames, "track deleted");
            }
            keep
        });

        for (idx, detection) in valid.iter().enumerate() {
            if assigned[idx] {
                continue;
            }
            let id = self.next_track_id;
            self.next_track_id += 1;
            self.tracks.insert(
                id,
                TrackState {
                    bbox: (*detection).clone(),
                    distance_m: distances[idx],
                    velocity_mps: 0.0,
                    age: 0,
                    missed_frames: 0,
                    range_rate: FirstOrderLowpassFilter::new(RANGE_RATE_CUTOFF_HZ, frame_dt_s),
                },
            );
            debug!(track_id = id, distance_m = distances[idx], "track created");
        }

        self.tracks
            .iter()
            .map(|(&id, state)| Track {
                id,
                bbox: state.bbox.clone(),
                distance_m: state.distance_m,
                velocity_mps: state.velocity_mps,
                age: state.age,
                missed_frames: state.missed_frames,
            })
            .collect()
    }

    /// Estimates range in meters from a bounding box via the pinhole proxy.
    ///
    /// The box height is floored at the configured minimum and the result is
    /// clamped to the configured maximum range. A non-positive height reports
    /// the maximum range, meaning "unknown, assume far".
    ///
    /// # Arguments
    ///
    /// * `bbox` - Detection box.
    ///
    /// # Returns
    ///
    /// Estimated range in meters.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adas::core::config::TrackerConfig;
    /// use adas::core::models::BoundingBox;
    /// use adas::tracking::MultiObjectTracker;
    ///
    /// let tracker = MultiObjectTracker::new(&TrackerConfig::default(), 0.05);
    /// let bbox = BoundingBox::new(0.0, 0.0, 50.0, 7.0, 0.9, "vehicle");
    /// assert_eq!(tracker.estimate_distance(&bbox), 5.0);
    /// ```
    pub fn estimate_distance(&self, bbox: &BoundingBox) -> f64 {
        let box_height = bbox.height();
        if box_height <= 0.0 {
            return self.max_distance_m;
        }
        (self.focal_length_px / box_height.max(self.min_box_height_px)).min(self.max_distance_m)
    }

    /// Returns the number of live tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Returns the cumulative number of detections dropped by validation.
    pub fn rejected_detections(&self) -> u64 {
        self.rejected_detections
    }

    /// Clears the store, the id allocator, and the rejection counter.
    pub fn reset(&mut self) {
        debug!("tracker reset");
        self.tracks.clear();
        self.next_track_id = 1;
        self.rejected_detections = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn box_at(cx: f64, cy: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0, 0.9, "vehicle")
    }

    fn tracker() -> MultiObjectTracker {
        MultiObjectTracker::new(&TrackerConfig::default(), 0.05)
    }

    #[test]
    fn test_id_persists_across_small_motion() {
        let mut tracker = tracker();
        for frame in 0..5 {
            let cx = 400.0 + frame as f64;
            let tracks = tracker.update(&[box_at(cx, 300.0, 60.0, 40.0)]);
            assert_eq!(tracks.len(), 1);
            assert_eq!(tracks[0].id, 1);
            assert_eq!(tracks[0].missed_frames, 0);
        }
        assert_eq!(tracker.track_count(), 1);
    }

    #[test]
    fn test_age_counts_update_cycles() {
        let mut tracker = tracker();
        tracker.update(&[box_at(400.0, 300.0, 60.0, 40.0)]);
        let tracks = tracker.update(&[box_at(401.0, 300.0, 60.0, 40.0)]);
        assert_eq!(tracks[0].age, 1);

        // A missed frame still ages the track.
        let tracks = tracker.update(&[]);
        assert_eq!(tracks[0].age, 2);
        assert_eq!(tracks[0].missed_frames, 1);
    }

    #[test]
    fn test_track_deleted_after_miss_budget() {
        let config = TrackerConfig::default();
        let mut tracker = MultiObjectTracker::new(&config, 0.05);
        tracker.update(&[box_at(400.0, 300.0, 60.0, 40.0)]);

        // Survives exactly max_missed_frames empty frames.
        for _ in 0..config.max_missed_frames {
            let tracks = tracker.update(&[]);
            assert_eq!(tracks.len(), 1);
        }

        // One more empty frame exceeds the budget and deletes it.
        let tracks = tracker.update(&[]);
        assert!(tracks.is_empty());
        assert_eq!(tracker.track_count(), 0);
    }

    #[test]
    fn test_distant_detection_spawns_instead_of_matching() {
        let mut tracker = tracker();
        tracker.update(&[box_at(100.0, 100.0, 40.0, 30.0)]);

        // 200 px of motion exceeds the 120 px association threshold.
        let tracks = tracker.update(&[box_at(300.0, 100.0, 40.0, 30.0)]);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, 1);
        assert_eq!(tracks[0].missed_frames, 1);
        assert_eq!(tracks[1].id, 2);
        assert_eq!(tracks[1].missed_frames, 0);
    }

    #[test]
    fn test_velocity_zero_on_creation_then_signed_rate() {
        let dt = 0.05;
        let mut tracker = MultiObjectTracker::new(&TrackerConfig::default(), dt);

        // Default focal 35 px: height 10 px -> 3.5 m, height 14 px -> 2.5 m.
        let tracks = tracker.update(&[box_at(400.0, 300.0, 60.0, 10.0)]);
        assert_eq!(tracks[0].velocity_mps, 0.0);
        assert_abs_diff_eq!(tracks[0].distance_m, 3.5, epsilon = 1e-12);

        let tracks = tracker.update(&[box_at(400.0, 300.0, 60.0, 14.0)]);
        let kf = 2.0 * PI * RANGE_RATE_CUTOFF_HZ * dt / (1.0 + 2.0 * PI * RANGE_RATE_CUTOFF_HZ * dt);
        let raw_rate = (2.5 - 3.5) / dt;
        assert_abs_diff_eq!(tracks[0].velocity_mps, kf * raw_rate, epsilon = 1e-9);
        assert!(tracks[0].velocity_mps < 0.0);
    }

    #[test]
    fn test_missed_frames_stretch_the_rate_window() {
        let dt = 0.05;
        let mut tracker = MultiObjectTracker::new(&TrackerConfig::default(), dt);
        tracker.update(&[box_at(400.0, 300.0, 60.0, 10.0)]);
        tracker.update(&[]);
        tracker.update(&[]);

        // Re-associated after two missed frames: the delta spans three periods.
        let tracks = tracker.update(&[box_at(400.0, 300.0, 60.0, 14.0)]);
        let kf = 2.0 * PI * RANGE_RATE_CUTOFF_HZ * dt / (1.0 + 2.0 * PI * RANGE_RATE_CUTOFF_HZ * dt);
        let raw_rate = (2.5 - 3.5) / (dt * 3.0);
        assert_abs_diff_eq!(tracks[0].velocity_mps, kf * raw_rate, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_detection_dropped_not_fatal() {
        let mut tracker = tracker();
        let bad = BoundingBox::new(50.0, 50.0, 40.0, 90.0, 0.9, "vehicle");
        let tracks = tracker.update(&[bad, box_at(400.0, 300.0, 60.0, 40.0)]);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracker.rejected_detections(), 1);
    }

    #[test]
    fn test_equidistant_detection_goes_to_lowest_track_id() {
        let mut tracker = tracker();
        tracker.update(&[box_at(100.0, 100.0, 40.0, 30.0), box_at(300.0, 100.0, 40.0, 30.0)]);

        // One detection exactly between the two tracks: track 1 claims it.
        let tracks = tracker.update(&[box_at(200.0, 100.0, 40.0, 30.0)]);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, 1);
        assert_eq!(tracks[0].missed_frames, 0);
        assert_eq!(tracks[1].id, 2);
        assert_eq!(tracks[1].missed_frames, 1);
    }

    #[test]
    fn test_distance_floor_and_clamp() {
        // Sub-minimum height is floored before division.
        let config = TrackerConfig {
            focal_length_px: 150.0,
            ..TrackerConfig::default()
        };
        let tracker = MultiObjectTracker::new(&config, 0.05);
        let tiny = BoundingBox::new(0.0, 0.0, 10.0, 0.5, 0.9, "vehicle");
        assert_abs_diff_eq!(tracker.estimate_distance(&tiny), 150.0, epsilon = 1e-9);

        // Close-but-tall boxes clamp to the configured maximum range.
        let config = TrackerConfig {
            focal_length_px: 1000.0,
            ..TrackerConfig::default()
        };
        let tracker = MultiObjectTracker::new(&config, 0.05);
        let near = BoundingBox::new(0.0, 0.0, 10.0, 2.0, 0.9, "vehicle");
        assert_abs_diff_eq!(tracker.estimate_distance(&near), 200.0, epsilon = 1e-9);

        // Degenerate height reports the sentinel.
        let flat = BoundingBox::new(0.0, 5.0, 10.0, 5.0, 0.9, "vehicle");
        assert_eq!(tracker.estimate_distance(&flat), 200.0);
    }

    #[test]
    fn test_reset_restarts_id_allocation() {
        let mut tracker = tracker();
        tracker.update(&[box_at(100.0, 100.0, 40.0, 30.0)]);
        tracker.update(&[box_at(400.0, 100.0, 40.0, 30.0)]);
        assert_eq!(tracker.track_count(), 2);

        tracker.reset();
        assert_eq!(tracker.track_count(), 0);
        assert_eq!(tracker.rejected_detections(), 0);

        let tracks = tracker.update(&[box_at(100.0, 100.0, 40.0, 30.0)]);
        assert_eq!(tracks[0].id, 1);
    }
}
