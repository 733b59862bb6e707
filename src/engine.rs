//! Swing phase state machine
//!
//! The engine consumes batches of heading-corrected orientation and
//! angular-rate samples, advances one discrete phase per update tick, and
//! invokes per-phase hooks so a host can react to transitions without
//! tracking the phase itself.

use log::debug;
use nalgebra::{UnitQuaternion, Vector2, Vector3};

use crate::convergence::ConvergenceGate;
use crate::heading::HeadingAlignment;
use crate::math::{FORWARD, QuaternionExt};
use crate::predicates;
use crate::predicates::RateTrend;
use crate::types::{EngineSettings, GainRequest, SwingPhase, SwingSample};

/// State visible to phase hooks at the moment they run
#[derive(Debug, Clone, Copy)]
pub struct SwingSnapshot {
    /// Phase the engine is in when the hook fires (the new phase for
    /// one-shot entry hooks)
    pub phase: SwingPhase,
    /// Timestamp of the sample that drove this tick, seconds
    pub timestamp: f64,
    /// Whether the orientation filter has converged
    pub converged: bool,
    /// Ball direction in corrected world space, valid from `Address` onward
    pub ball_direction: Option<Vector3<f32>>,
}

/// Per-phase hook slot
pub type PhaseHook = Box<dyn FnMut(&SwingSnapshot) + Send>;

/// Swing phase detection engine
///
/// Owns the convergence gate, the heading alignment, the rate trend
/// accumulators, and the current phase. [`SwingEngine::advance`] is called
/// once per update tick with whatever samples arrived since the previous
/// tick; it performs at most one phase transition per call.
///
/// # Example
/// ```
/// use nalgebra::{UnitQuaternion, Vector2};
/// use swing_phase::{SwingEngine, SwingPhase, SwingSample};
///
/// let mut engine = SwingEngine::new();
/// engine.on_enter(SwingPhase::Impact, |snapshot| {
///     println!("impact at {:.3} s", snapshot.timestamp);
/// });
///
/// let sample = SwingSample::new(UnitQuaternion::identity(), Vector2::zeros(), 0.0);
/// engine.advance(&[sample]);
/// assert_eq!(engine.phase(), SwingPhase::Start);
/// ```
pub struct SwingEngine {
    settings: EngineSettings,
    phase: SwingPhase,
    gate: ConvergenceGate,
    heading: HeadingAlignment,
    trend: RateTrend,
    /// Euler angles (degrees) captured at `Start` exit, re-captured on
    /// address violations and at `Address` entry
    baseline: Vector3<f32>,
    /// Timestamp when the address dwell began
    dwell_started: f64,
    /// Window averages snapshotted at `Transition` entry
    transition_entry: Vector2<f32>,
    /// Ball direction captured at `Address` entry, cleared each cycle
    ball_direction: Option<Vector3<f32>>,
    /// Freshest raw sample seen, kept across starved ticks
    last_sample: Option<SwingSample>,
    /// Timestamp of the freshest sample, for hook snapshots
    now: f64,
    on_enter: [Option<PhaseHook>; SwingPhase::COUNT],
    on_tick: [Option<PhaseHook>; SwingPhase::COUNT],
}

impl SwingEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    /// Create an engine with the given settings
    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            settings,
            phase: SwingPhase::Start,
            gate: ConvergenceGate::new(settings.gate),
            heading: HeadingAlignment::new(),
            trend: RateTrend::new(settings.rate_window),
            baseline: Vector3::zeros(),
            dwell_started: 0.0,
            transition_entry: Vector2::zeros(),
            ball_direction: None,
            last_sample: None,
            now: 0.0,
            on_enter: std::array::from_fn(|_| None),
            on_tick: std::array::from_fn(|_| None),
        }
    }

    /// Register a one-shot hook invoked on entry to `phase`
    ///
    /// Fires exactly once per transition, before `advance` returns,
    /// including the synthetic re-entry into `Start` at the end of a cycle.
    pub fn on_enter<F>(&mut self, phase: SwingPhase, hook: F)
    where
        F: FnMut(&SwingSnapshot) + Send + 'static,
    {
        self.on_enter[phase.index()] = Some(Box::new(hook));
    }

    /// Register a continuous hook invoked every tick spent in `phase`
    ///
    /// Fires once per `advance` call, after any transition, bound to the
    /// phase the engine is in when the call returns. Starved ticks (empty
    /// batches) still fire it with stale state.
    pub fn on_tick<F>(&mut self, phase: SwingPhase, hook: F)
    where
        F: FnMut(&SwingSnapshot) + Send + 'static,
    {
        self.on_tick[phase.index()] = Some(Box::new(hook));
    }

    /// Advance the state machine by one update tick
    ///
    /// `batch` holds every sample produced since the previous tick, in
    /// arrival order; it may be empty. At most one phase transition occurs
    /// per call, even when the batch would satisfy several predicates in
    /// sequence.
    pub fn advance(&mut self, batch: &[SwingSample]) {
        if let Some(last) = batch.last() {
            self.last_sample = Some(*last);
            self.now = last.timestamp;
        }

        match self.phase {
            SwingPhase::Start => self.tick_start(batch),
            SwingPhase::PreAddress => self.tick_pre_address(),
            SwingPhase::Address => self.tick_address(),
            SwingPhase::Backswing => self.tick_backswing(batch),
            SwingPhase::Transition => self.tick_transition(batch),
            SwingPhase::Downswing => self.tick_downswing(batch),
            SwingPhase::Impact => self.tick_impact(batch),
            SwingPhase::FollowThrough => self.tick_follow_through(batch),
            SwingPhase::End => self.tick_end(),
        }

        let snapshot = self.snapshot(self.now);
        if let Some(hook) = self.on_tick[self.phase.index()].as_mut() {
            hook(&snapshot);
        }
    }

    /// Abort the capture session and return to a freshly-initialized state
    ///
    /// Resets the phase to `Start`, re-arms the convergence gate (queueing a
    /// fast-convergence gain request), clears the rate accumulators, and
    /// discards the ball direction and heading offset. No entry hook fires.
    pub fn abort(&mut self) {
        debug!("swing capture aborted, resetting engine");
        self.phase = SwingPhase::Start;
        self.gate.reset();
        self.heading.reset();
        self.trend.reset();
        self.baseline = Vector3::zeros();
        self.dwell_started = 0.0;
        self.transition_entry = Vector2::zeros();
        self.ball_direction = None;
        self.last_sample = None;
    }

    /// Recompute the heading offset from the freshest raw sample
    ///
    /// No-op until at least one sample has been seen. Permitted mid-swing;
    /// the new offset applies from the next corrected sample onward.
    pub fn recalibrate(&mut self) {
        if let Some(sample) = self.last_sample {
            self.heading.recalibrate(sample.orientation);
        }
    }

    /// Current phase
    pub fn phase(&self) -> SwingPhase {
        self.phase
    }

    /// Whether the orientation filter has converged
    pub fn is_converged(&self) -> bool {
        self.gate.is_converged()
    }

    /// Ball direction in corrected world space, valid from `Address` onward
    pub fn ball_direction(&self) -> Option<Vector3<f32>> {
        self.ball_direction
    }

    /// Current heading offset rotation
    pub fn heading_offset(&self) -> UnitQuaternion<f32> {
        self.heading.offset()
    }

    /// Drain the pending filter gain request, if any
    pub fn take_gain_request(&mut self) -> Option<GainRequest> {
        self.gate.take_gain_request()
    }

    /// Current engine settings
    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Replace the engine settings
    ///
    /// Rebuilds the rate accumulators for the new window size; an
    /// in-progress decay measurement starts over.
    pub fn set_settings(&mut self, settings: EngineSettings) {
        self.settings = settings;
        self.gate.set_settings(settings.gate);
        self.trend = RateTrend::new(settings.rate_window);
    }

    fn tick_start(&mut self, batch: &[SwingSample]) {
        let was_converged = self.gate.is_converged();
        for sample in batch {
            self.gate.observe(self.heading.apply(sample.orientation));
        }
        if !self.gate.is_converged() {
            return;
        }
        // One-time alignment the moment convergence is declared; later
        // cycles keep the offset because the converged flag latches.
        if !was_converged {
            if let Some(sample) = self.last_sample {
                self.heading.recalibrate(sample.orientation);
            }
        }
        let Some(sample) = self.last_sample else {
            return;
        };
        self.baseline = self.corrected_euler(&sample);
        self.dwell_started = sample.timestamp;
        self.enter(SwingPhase::PreAddress, sample.timestamp);
    }

    fn tick_pre_address(&mut self) {
        let Some(sample) = self.last_sample else {
            return;
        };
        let euler = self.corrected_euler(&sample);

        let settled = predicates::within_address_window(&euler, &self.settings)
            && predicates::within_motion_limit(
                &euler,
                &self.baseline,
                self.settings.address_motion_limit,
            );
        if !settled {
            // Waggle or drift: re-anchor and restart the dwell timer
            self.baseline = euler;
            self.dwell_started = sample.timestamp;
            return;
        }

        if sample.timestamp - self.dwell_started >= f64::from(self.settings.address_dwell) {
            self.baseline = euler;
            let corrected = self.heading.apply(sample.orientation);
            self.ball_direction = Some(corrected * FORWARD);
            self.enter(SwingPhase::Address, sample.timestamp);
        }
    }

    fn tick_address(&mut self) {
        let Some(sample) = self.last_sample else {
            return;
        };
        let euler = self.corrected_euler(&sample);
        if predicates::backswing_started(
            euler.z,
            self.baseline.z,
            self.settings.backswing_yaw_threshold,
            self.settings.handedness,
        ) {
            self.trend.reset();
            self.enter(SwingPhase::Backswing, sample.timestamp);
        }
    }

    fn tick_backswing(&mut self, batch: &[SwingSample]) {
        let Some(point) = self.roll_trend(batch) else {
            return;
        };
        if predicates::rates_relaxing(&point.average, &point.slope) {
            self.transition_entry = point.average;
            self.enter(SwingPhase::Transition, self.now);
        }
    }

    fn tick_transition(&mut self, batch: &[SwingSample]) {
        let Some(point) = self.roll_trend(batch) else {
            return;
        };
        if predicates::rates_inverted(&point.average, &point.slope, &self.transition_entry) {
            self.enter(SwingPhase::Downswing, self.now);
        }
    }

    fn tick_downswing(&mut self, batch: &[SwingSample]) {
        let Some(ball) = self.ball_direction else {
            return;
        };
        // The club can sweep several degrees between rendered ticks, so every
        // sample in the batch is tested in arrival order; the first crossing
        // decides the transition.
        for sample in batch {
            let club = self.heading.apply(sample.orientation) * FORWARD;
            if predicates::impact_detected(&club, &ball, self.settings.impact_distance) {
                self.enter(SwingPhase::Impact, sample.timestamp);
                return;
            }
        }
    }

    fn tick_impact(&mut self, batch: &[SwingSample]) {
        let Some(ball) = self.ball_direction else {
            return;
        };
        for sample in batch {
            let club = self.heading.apply(sample.orientation) * FORWARD;
            if predicates::follow_through_detected(
                &club,
                &ball,
                self.settings.follow_through_margin,
                self.settings.handedness,
            ) {
                self.trend.reset();
                self.enter(SwingPhase::FollowThrough, sample.timestamp);
                return;
            }
        }
    }

    fn tick_follow_through(&mut self, batch: &[SwingSample]) {
        let Some(point) = self.roll_trend(batch) else {
            return;
        };
        if predicates::rates_relaxing(&point.average, &point.slope) {
            self.enter(SwingPhase::End, self.now);
        }
    }

    fn tick_end(&mut self) {
        // Unconditional loop back; per-swing state is discarded so the next
        // cycle captures fresh baselines and a fresh ball direction.
        self.ball_direction = None;
        self.trend.reset();
        self.enter(SwingPhase::Start, self.now);
    }

    /// Roll the moving averages forward with this tick's rendered sample
    ///
    /// Starved ticks contribute nothing; the latest completed trend point is
    /// re-evaluated instead, which is idempotent.
    fn roll_trend(&mut self, batch: &[SwingSample]) -> Option<predicates::TrendPoint> {
        if let Some(sample) = batch.last() {
            self.trend.push(sample.rate, sample.timestamp);
        }
        self.trend.latest()
    }

    fn corrected_euler(&self, sample: &SwingSample) -> Vector3<f32> {
        self.heading.apply(sample.orientation).to_euler_degrees()
    }

    fn snapshot(&self, timestamp: f64) -> SwingSnapshot {
        SwingSnapshot {
            phase: self.phase,
            timestamp,
            converged: self.gate.is_converged(),
            ball_direction: self.ball_direction,
        }
    }

    fn enter(&mut self, next: SwingPhase, timestamp: f64) {
        debug!("phase transition {:?} -> {:?} at {:.3} s", self.phase, next, timestamp);
        self.phase = next;
        let snapshot = self.snapshot(timestamp);
        if let Some(hook) = self.on_enter[next.index()].as_mut() {
            hook(&snapshot);
        }
    }
}

impl Default for SwingEngine {
    fn default() -> Self {
        Self::new()
    }
}
