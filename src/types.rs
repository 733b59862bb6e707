//! Core types and configuration for swing phase detection

use nalgebra::{UnitQuaternion, Vector2};

/// Discrete phase of a golf swing
///
/// Exactly one phase is active at a time. The engine advances through the
/// phases cyclically:
///
/// `Start → PreAddress → Address → Backswing → Transition → Downswing →
/// Impact → FollowThrough → End → Start`
///
/// There is no terminal phase; `End` loops back to `Start` unconditionally so
/// the engine is immediately ready for the next swing.
///
/// # Example
/// ```
/// use swing_phase::SwingPhase;
///
/// let phase = SwingPhase::default();
/// assert_eq!(phase, SwingPhase::Start);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwingPhase {
    /// Waiting for the orientation filter to converge
    #[default]
    Start,
    /// Filter converged; waiting for the club to settle at address
    PreAddress,
    /// Club held still at address; waiting for the takeaway
    Address,
    /// Club moving away from the ball
    Backswing,
    /// Angular rates decaying at the top of the swing
    Transition,
    /// Club accelerating back toward the ball
    Downswing,
    /// Club head at the ball position
    Impact,
    /// Club past the ball, still moving
    FollowThrough,
    /// Swing complete; loops back to `Start` on the next tick
    End,
}

impl SwingPhase {
    /// Number of phases
    pub const COUNT: usize = 9;

    /// All phases in cycle order
    pub const ALL: [SwingPhase; Self::COUNT] = [
        SwingPhase::Start,
        SwingPhase::PreAddress,
        SwingPhase::Address,
        SwingPhase::Backswing,
        SwingPhase::Transition,
        SwingPhase::Downswing,
        SwingPhase::Impact,
        SwingPhase::FollowThrough,
        SwingPhase::End,
    ];

    /// Stable index of this phase, usable for per-phase tables
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Golfer handedness and sensor mounting convention
///
/// The backswing and follow-through predicates depend on which way the club
/// yaws away from the ball. The reference convention is a right-handed golfer
/// with yaw increasing during the takeaway; `Left` mirrors both tests. This is
/// explicit configuration and is never inferred from the sample stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Handedness {
    /// Yaw increases past the address baseline during the takeaway
    #[default]
    Right,
    /// Yaw decreases past the address baseline during the takeaway
    Left,
}

impl Handedness {
    /// Sign of the yaw excursion during the takeaway (+1 right, -1 left)
    pub fn yaw_sign(self) -> f32 {
        match self {
            Handedness::Right => 1.0,
            Handedness::Left => -1.0,
        }
    }
}

/// One orientation + angular-rate sample from the fusion filter
///
/// `rate` holds (pitch-rate, yaw-rate) in degrees per second, time-aligned
/// with `orientation`. `timestamp` is in seconds on the producer's clock and
/// must be monotonically non-decreasing within a stream.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwingSample {
    /// Club attitude estimated by the fusion filter (raw, heading-uncorrected)
    pub orientation: UnitQuaternion<f32>,
    /// (pitch-rate, yaw-rate) in degrees per second
    pub rate: Vector2<f32>,
    /// Sample time in seconds
    pub timestamp: f64,
}

impl SwingSample {
    /// Create a sample from its parts
    pub fn new(orientation: UnitQuaternion<f32>, rate: Vector2<f32>, timestamp: f64) -> Self {
        Self {
            orientation,
            rate,
            timestamp,
        }
    }
}

/// Gain change requested of the external fusion filter
///
/// The convergence gate queues `FastConvergence` when it is (re)armed and
/// `SteadyState` once it declares convergence. The host drains pending
/// requests with [`crate::SwingEngine::take_gain_request`] and forwards the
/// concrete gain value to the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GainRequest {
    /// Raise the filter gain so the estimate converges quickly
    FastConvergence,
    /// Lower the filter gain to its steady-state value
    SteadyState,
}

impl GainRequest {
    /// Concrete gain value for this request under the given settings
    pub fn gain(self, settings: &GateSettings) -> f32 {
        match self {
            GainRequest::FastConvergence => settings.fast_gain,
            GainRequest::SteadyState => settings.steady_gain,
        }
    }
}

/// Convergence gate settings
///
/// # Example
/// ```
/// use swing_phase::GateSettings;
///
/// let settings = GateSettings {
///     tolerance: 0.02, // tighter convergence test
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateSettings {
    /// Number of samples averaged by the convergence test (typically 10)
    pub window: usize,
    /// Per-component relative error bound for declaring convergence (typically 0.05)
    pub tolerance: f32,
    /// Filter gain requested while converging (typically 10.0)
    pub fast_gain: f32,
    /// Filter gain requested once converged (typically 0.5)
    pub steady_gain: f32,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            window: 10,
            tolerance: 0.05,
            fast_gain: 10.0,
            steady_gain: 0.5,
        }
    }
}

/// Swing engine settings
///
/// Configuration for the phase state machine and its transition predicates.
/// Angles are in degrees, durations in seconds, and the impact/follow-through
/// thresholds are chord distances between unit vectors.
///
/// # Example
/// ```
/// use swing_phase::{EngineSettings, Handedness};
///
/// let settings = EngineSettings {
///     handedness: Handedness::Left,
///     backswing_yaw_threshold: 8.0, // less sensitive takeaway detection
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineSettings {
    /// Golfer handedness / sensor mounting convention
    pub handedness: Handedness,
    /// Time the club must hold still before address is declared (typically 2.0 s)
    pub address_dwell: f32,
    /// Minimum roll angle accepted at address
    pub address_roll_min: f32,
    /// Maximum roll angle accepted at address
    pub address_roll_max: f32,
    /// Minimum pitch angle accepted at address
    pub address_pitch_min: f32,
    /// Maximum pitch angle accepted at address
    pub address_pitch_max: f32,
    /// Maximum movement from the baseline angles during the address dwell
    ///
    /// Exceeding this on any axis restarts the dwell timer, which absorbs
    /// pre-address waggles.
    pub address_motion_limit: f32,
    /// Yaw excursion past the address baseline that starts the backswing
    pub backswing_yaw_threshold: f32,
    /// Samples per moving-average window for the rate decay tests (typically 5)
    pub rate_window: u32,
    /// Chord distance between club vector and ball direction at impact (typically 0.175)
    pub impact_distance: f32,
    /// Chord distance past the ball that confirms follow-through (typically 0.25)
    pub follow_through_margin: f32,
    /// Convergence gate settings
    pub gate: GateSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            handedness: Handedness::default(),
            address_dwell: 2.0,
            address_roll_min: -30.0,
            address_roll_max: 30.0,
            address_pitch_min: -30.0,
            address_pitch_max: 30.0,
            address_motion_limit: 3.0,
            backswing_yaw_threshold: 5.0,
            rate_window: 5,
            impact_distance: 0.175,
            follow_through_margin: 0.25,
            gate: GateSettings::default(),
        }
    }
}
