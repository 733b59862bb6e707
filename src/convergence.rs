//! Orientation filter convergence detection
//!
//! After a cold start or a reset, the external fusion filter runs with a high
//! gain so its orientation estimate converges quickly. The gate watches the
//! quaternion stream, declares convergence once the estimate has stabilized,
//! and requests the steady-state gain back from the filter. The swing engine
//! must not leave the `Start` phase until the gate reports converged.

use std::collections::VecDeque;

use log::{debug, info};
use nalgebra::UnitQuaternion;

use crate::types::{GainRequest, GateSettings};

/// Orientation filter convergence gate
///
/// Buffers the most recent orientation samples and compares their
/// component-wise mean against the latest sample. When every component of the
/// normalized relative difference `(mean - latest) / (mean + latest)` lies
/// within the tolerance, convergence is declared, the buffer is cleared, and
/// the `converged` flag latches until [`ConvergenceGate::reset`].
pub struct ConvergenceGate {
    settings: GateSettings,
    /// Recent samples, oldest first, bounded at `settings.window`
    buffer: VecDeque<UnitQuaternion<f32>>,
    converged: bool,
    pending_gain: Option<GainRequest>,
}

impl ConvergenceGate {
    /// Create a gate with the given settings, armed for a new session
    pub fn new(settings: GateSettings) -> Self {
        Self {
            settings,
            buffer: VecDeque::with_capacity(settings.window),
            converged: false,
            pending_gain: Some(GainRequest::FastConvergence),
        }
    }

    /// Observe one orientation sample and return the converged flag
    ///
    /// Once convergence has been declared this is a no-op that keeps
    /// returning `true`; the flag only clears on [`ConvergenceGate::reset`].
    pub fn observe(&mut self, sample: UnitQuaternion<f32>) -> bool {
        if self.converged {
            return true;
        }

        self.buffer.push_back(sample);
        if self.buffer.len() > self.settings.window {
            self.buffer.pop_front();
        }
        if self.buffer.len() < self.settings.window {
            return false;
        }

        if self.window_settled(sample) {
            info!(
                "orientation filter converged after {} samples, requesting steady-state gain",
                self.settings.window
            );
            self.converged = true;
            self.buffer.clear();
            self.pending_gain = Some(GainRequest::SteadyState);
        }

        self.converged
    }

    /// Whether convergence has been declared
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Drain the pending gain request, if any
    ///
    /// The host forwards the request to the fusion filter. Requests are
    /// queued on arm (fast gain) and on convergence (steady-state gain).
    pub fn take_gain_request(&mut self) -> Option<GainRequest> {
        self.pending_gain.take()
    }

    /// Re-arm the gate for a new capture session
    ///
    /// Clears the buffer and the converged flag and queues a
    /// fast-convergence gain request.
    pub fn reset(&mut self) {
        debug!("convergence gate reset, requesting fast-convergence gain");
        self.buffer.clear();
        self.converged = false;
        self.pending_gain = Some(GainRequest::FastConvergence);
    }

    /// Gate settings
    pub fn settings(&self) -> GateSettings {
        self.settings
    }

    /// Replace the gate settings
    ///
    /// Takes effect from the next observation; an in-progress window keeps
    /// its buffered samples.
    pub fn set_settings(&mut self, settings: GateSettings) {
        self.settings = settings;
    }

    /// Number of samples currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Compare the buffered mean against the latest sample, per component
    fn window_settled(&self, latest: UnitQuaternion<f32>) -> bool {
        let n = self.buffer.len() as f32;
        let mut mean = [0.0f32; 4];
        for q in &self.buffer {
            let q = q.as_ref();
            mean[0] += q.w;
            mean[1] += q.i;
            mean[2] += q.j;
            mean[3] += q.k;
        }
        for component in &mut mean {
            *component /= n;
        }

        let latest = latest.as_ref();
        let latest = [latest.w, latest.i, latest.j, latest.k];

        mean.iter()
            .zip(latest.iter())
            .all(|(&m, &l)| relative_error(m, l).abs() <= self.settings.tolerance)
    }
}

impl Default for ConvergenceGate {
    fn default() -> Self {
        Self::new(GateSettings::default())
    }
}

/// Normalized relative difference between a window mean and the latest value
///
/// Identical values have exactly zero error (0/0 would otherwise produce
/// NaN). Ratios with magnitude >= 1 are inverted to guard against blow-up
/// when the denominator is near zero. The guard is a heuristic, not a
/// rigorous normalization; NaN ratios fail the tolerance comparison and
/// leave the gate unconverged.
fn relative_error(mean: f32, latest: f32) -> f32 {
    let difference = mean - latest;
    if difference == 0.0 {
        return 0.0;
    }
    let ratio = difference / (mean + latest);
    if ratio.abs() >= 1.0 { 1.0 / ratio } else { ratio }
}
