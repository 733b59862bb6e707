//! Swing Phase - real-time golf swing phase detection
//!
//! This library determines, in real time, which phase of a golf swing a
//! sensor-equipped club is in. It consumes a stream of orientation
//! quaternions and angular-rate samples produced by an external AHRS fusion
//! filter and advances a cyclic nine-phase state machine, one transition per
//! update tick, firing per-phase hooks a host application registers.
//!
//! # Features
//!
//! - Nine-phase cyclic swing state machine with per-phase hooks
//! - Filter convergence gating with automatic gain change requests
//! - One-time heading alignment between the filter and the world frame
//! - Batch-scanning impact detection that never misses a fast sample
//! - Bounded producer-to-engine sample queue for ODR/tick rate mismatch
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::{UnitQuaternion, Vector2};
//! use swing_phase::{SwingEngine, SwingPhase, SwingSample};
//!
//! let mut engine = SwingEngine::new();
//! engine.on_enter(SwingPhase::Impact, |snapshot| {
//!     println!("impact at {:.3} s", snapshot.timestamp);
//! });
//!
//! // Each update tick, hand the engine every sample that arrived since the
//! // previous tick (here a single synthetic one).
//! let sample = SwingSample::new(UnitQuaternion::identity(), Vector2::zeros(), 0.0);
//! engine.advance(&[sample]);
//!
//! // Forward any pending gain request to the fusion filter.
//! if let Some(request) = engine.take_gain_request() {
//!     let _gain = request.gain(&engine.settings().gate);
//! }
//! ```

pub mod convergence;
mod engine;
pub mod heading;
mod math;
pub mod predicates;
pub mod stream;
mod types;

// Re-export all public types and functions
pub use convergence::ConvergenceGate;
pub use engine::{PhaseHook, SwingEngine, SwingSnapshot};
pub use heading::{HeadingAlignment, compute_offset};
pub use math::{DEG_TO_RAD, FORWARD, QuaternionExt, RAD_TO_DEG, Vector3Ext};
pub use predicates::{RateTrend, TrendPoint};
pub use stream::{SampleProducer, SampleReceiver, StreamError, sample_channel};
pub use types::*;
