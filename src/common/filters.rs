/// Represents a first-order lowpass filter for discrete time signals.
///
/// The tracker uses one instance per track to smooth the range rate derived
/// from frame-to-frame distance deltas, which are noisy at camera frame
/// rates. The filter keeps its state across missed frames so a re-acquired
/// track resumes from its last smoothed estimate.
///
/// # Examples
///
/// ```rust
/// use adas::common::filters::FirstOrderLowpassFilter;
///
/// let fc = 1.0; // Cutoff frequency in Hertz
/// let dt = 0.05; // Frame period in seconds
/// let mut range_rate = FirstOrderLowpassFilter::new(fc, dt);
///
/// let smoothed = range_rate.apply(-2.0);
/// assert!(smoothed > -2.0 && smoothed < 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct FirstOrderLowpassFilter {
    /// Filter constant
    kf: f64,
    /// State variable
    x1: f64,
}

impl FirstOrderLowpassFilter {
    /// Creates a new `FirstOrderLowpassFilter` instance with zero state.
    ///
    /// # Arguments
    ///
    /// * `fc` - Cutoff frequency in Hertz.
    /// * `dt` - Time step in seconds.
    ///
    /// # Returns
    ///
    /// A new `FirstOrderLowpassFilter` instance.
    pub fn new(fc: f64, dt: f64) -> Self {
        Self::with_initial(fc, dt, 0.0)
    }

    /// Creates a new `FirstOrderLowpassFilter` instance seeded with a state.
    ///
    /// # Arguments
    ///
    /// * `fc` - Cutoff frequency in Hertz.
    /// * `dt` - Time step in seconds.
    /// * `x1` - Initial state.
    ///
    /// # Returns
    ///
    /// A new `FirstOrderLowpassFilter` instance.
    pub fn with_initial(fc: f64, dt: f64, x1: f64) -> Self {
        let kf =
            2.0 * std::f64::consts::PI * fc * dt / (1.0 + 2.0 * std::f64::consts::PI * fc * dt);
        Self { kf, x1 }
    }

    /// Applies the lowpass filter to the input signal.
    ///
    /// # Arguments
    ///
    /// * `x` - Input signal value.
    ///
    /// # Returns
    ///
    /// The filtered output signal value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adas::common::filters::FirstOrderLowpassFilter;
    ///
    /// let mut filter = FirstOrderLowpassFilter::new(1.0, 0.05);
    /// let first = filter.apply(10.0);
    /// let second = filter.apply(10.0);
    /// assert!(second > first);
    /// ```
    pub fn apply(&mut self, x: f64) -> f64 {
        self.x1 = (1.0 - self.kf) * self.x1 + self.kf * x;

        // If previous or current is NaN, reset filter.
        if self.x1.is_nan() {
            self.x1 = 0.0;
        }

        self.x1
    }

    /// Returns the current filter state without advancing it.
    pub fn value(&self) -> f64 {
        self.x1
    }

    /// Resets the filter state to zero.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
    }
}
