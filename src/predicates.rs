//! Phase transition predicates
//!
//! Pure, bounded-time tests over current and recent samples. The engine owns
//! all state; everything here is a total function over well-typed numeric
//! input and must tolerate degenerate values (momentarily zero rates, NaN
//! from a misbehaving producer) without panicking.

use nalgebra::{Vector2, Vector3};

use crate::types::{EngineSettings, Handedness};

/// Roll and pitch both inside the configured address window
///
/// Yaw is deliberately ignored; the golfer may face any direction.
pub fn within_address_window(euler_deg: &Vector3<f32>, settings: &EngineSettings) -> bool {
    euler_deg.x >= settings.address_roll_min
        && euler_deg.x <= settings.address_roll_max
        && euler_deg.y >= settings.address_pitch_min
        && euler_deg.y <= settings.address_pitch_max
}

/// All three Euler angles within `limit` degrees of the baseline
pub fn within_motion_limit(euler_deg: &Vector3<f32>, baseline: &Vector3<f32>, limit: f32) -> bool {
    (euler_deg.x - baseline.x).abs() < limit
        && (euler_deg.y - baseline.y).abs() < limit
        && (euler_deg.z - baseline.z).abs() < limit
}

/// Yaw has crossed the takeaway threshold on the handedness-appropriate side
pub fn backswing_started(
    yaw_deg: f32,
    baseline_yaw_deg: f32,
    threshold_deg: f32,
    handedness: Handedness,
) -> bool {
    handedness.yaw_sign() * (yaw_deg - baseline_yaw_deg) > threshold_deg
}

/// Both axes' moving averages decaying toward zero
///
/// Per axis: the average is not growing in its own direction, i.e. neither
/// (value > 0 and slope > 0) nor (value < 0 and slope < 0). Used for the
/// backswing-to-transition test and, on post-impact data, for swing end.
pub fn rates_relaxing(average: &Vector2<f32>, slope: &Vector2<f32>) -> bool {
    axis_relaxing(average.x, slope.x) && axis_relaxing(average.y, slope.y)
}

fn axis_relaxing(value: f32, slope: f32) -> bool {
    !(value > 0.0 && slope > 0.0) && !(value < 0.0 && slope < 0.0)
}

/// Both axes' moving averages inverted since the transition began
///
/// Per axis: the average's sign differs from the snapshot taken at transition
/// entry, and the slope carries the new direction (average and slope agree,
/// so the club is accelerating into the downswing rather than drifting around
/// zero).
pub fn rates_inverted(
    average: &Vector2<f32>,
    slope: &Vector2<f32>,
    transition_entry: &Vector2<f32>,
) -> bool {
    axis_inverted(average.x, slope.x, transition_entry.x)
        && axis_inverted(average.y, slope.y, transition_entry.y)
}

fn axis_inverted(value: f32, slope: f32, entry: f32) -> bool {
    value * slope > 0.0 && value * entry <= 0.0
}

/// Club vector within the impact threshold of the ball direction
///
/// Both vectors are unit length, so the Euclidean distance is a chord
/// distance; the default threshold 0.175 corresponds to roughly 10 degrees.
pub fn impact_detected(club: &Vector3<f32>, ball: &Vector3<f32>, threshold: f32) -> bool {
    (club - ball).norm() <= threshold
}

/// Club vector past the ball direction by the follow-through margin
///
/// "Past" is the side of the ball the club exits toward for the configured
/// handedness, measured by the sign of the vertical component of
/// `ball x club`.
pub fn follow_through_detected(
    club: &Vector3<f32>,
    ball: &Vector3<f32>,
    margin: f32,
    handedness: Handedness,
) -> bool {
    let lateral = ball.cross(club).z;
    handedness.yaw_sign() * lateral < 0.0 && (club - ball).norm() >= margin
}

/// Latest completed moving-average window and its slope
#[derive(Debug, Clone, Copy)]
pub struct TrendPoint {
    /// (pitch, yaw) rate average over the last completed window, deg/s
    pub average: Vector2<f32>,
    /// Change of the average versus the previous window, deg/s per second
    pub slope: Vector2<f32>,
}

/// Windowed moving average over (pitch, yaw) angular rates
///
/// Accumulates one sample per tick; every `window` samples a new average is
/// completed and compared against the previous one to produce a slope. The
/// decay and inversion predicates always compare "previous window average"
/// against "current window average" through the [`TrendPoint`] this yields.
#[derive(Debug, Clone, Copy)]
pub struct RateTrend {
    window: u32,
    sum: Vector2<f32>,
    count: u32,
    /// Last completed window: (average, completion timestamp)
    previous: Option<(Vector2<f32>, f64)>,
    latest: Option<TrendPoint>,
}

impl RateTrend {
    /// Create an accumulator with the given window size (minimum 1)
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            sum: Vector2::zeros(),
            count: 0,
            previous: None,
            latest: None,
        }
    }

    /// Accumulate one rate sample
    ///
    /// Returns the new trend point when this sample completes a window and a
    /// previous window exists to take a slope against.
    pub fn push(&mut self, rate: Vector2<f32>, timestamp: f64) -> Option<TrendPoint> {
        self.sum += rate;
        self.count += 1;
        if self.count < self.window {
            return None;
        }

        let average = self.sum / self.count as f32;
        self.sum = Vector2::zeros();
        self.count = 0;

        let completed = match self.previous {
            Some((previous_average, previous_time)) => {
                let dt = (timestamp - previous_time) as f32;
                let slope = if dt > 0.0 {
                    (average - previous_average) / dt
                } else {
                    Vector2::zeros()
                };
                let point = TrendPoint { average, slope };
                self.latest = Some(point);
                Some(point)
            }
            None => None,
        };
        self.previous = Some((average, timestamp));
        completed
    }

    /// Latest completed trend point, if two windows have finished
    pub fn latest(&self) -> Option<TrendPoint> {
        self.latest
    }

    /// Clear all accumulated state
    pub fn reset(&mut self) {
        self.sum = Vector2::zeros();
        self.count = 0;
        self.previous = None;
        self.latest = None;
    }
}
