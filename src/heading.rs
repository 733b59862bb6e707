//! Heading alignment between the fusion filter and the world frame
//!
//! The fusion filter's internal "north" is arbitrary relative to where the
//! golfer is actually facing. A single corrective rotation about the vertical
//! axis, computed once per capture session from one orientation sample, lines
//! the filter's reference up with the application's forward axis. Every raw
//! sample is corrected as `offset * raw` before it reaches the convergence
//! gate, the predicates, or any external consumer.

use log::info;
use nalgebra::{UnitQuaternion, Vector3};

use crate::math::{FORWARD, RAD_TO_DEG, Vector3Ext};

/// Compute the heading offset from one orientation sample
///
/// Rotates the canonical forward axis by `sample`, projects the result into
/// the horizontal plane, and measures the signed angle back to the forward
/// axis with a cross-product arcsine. The returned rotation about the
/// vertical axis by the negated angle cancels the filter's heading bias.
///
/// A degenerate horizontal projection (club pointing straight up or down)
/// yields the identity rotation.
pub fn compute_offset(sample: UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    let rotated = sample * FORWARD;
    let projected = rotated.horizontal().safe_normalize();

    // Signed angle about the vertical axis via FORWARD x projected. The
    // arcsine form is only meaningful for offsets within +/-90 degrees.
    let sin_angle = FORWARD.cross(&projected).z.clamp(-1.0, 1.0);
    let angle = sin_angle.asin();

    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -angle)
}

/// Heading alignment state
///
/// Holds the current offset rotation, identity until the first calibration.
/// The offset stays constant between explicit recalibrations; mid-swing
/// recalibration is permitted and takes effect from the next corrected
/// sample.
#[derive(Debug, Clone, Copy)]
pub struct HeadingAlignment {
    offset: UnitQuaternion<f32>,
}

impl HeadingAlignment {
    /// Create an alignment with the identity offset
    pub fn new() -> Self {
        Self {
            offset: UnitQuaternion::identity(),
        }
    }

    /// Recompute the offset from the given raw orientation sample
    pub fn recalibrate(&mut self, sample: UnitQuaternion<f32>) {
        self.offset = compute_offset(sample);
        let (_, _, yaw) = self.offset.euler_angles();
        info!("heading recalibrated, offset {:.2} degrees", yaw * RAD_TO_DEG);
    }

    /// Apply the offset to a raw orientation sample
    pub fn apply(&self, raw: UnitQuaternion<f32>) -> UnitQuaternion<f32> {
        self.offset * raw
    }

    /// Current offset rotation
    pub fn offset(&self) -> UnitQuaternion<f32> {
        self.offset
    }

    /// Discard the offset, returning to the identity rotation
    pub fn reset(&mut self) {
        self.offset = UnitQuaternion::identity();
    }
}

impl Default for HeadingAlignment {
    fn default() -> Self {
        Self::new()
    }
}
