//! Mathematical utilities and nalgebra extensions for swing phase detection

use nalgebra::{UnitQuaternion, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Canonical forward axis in the corrected world frame.
///
/// The heading offset aligns the filter's internal reference with this axis;
/// the ball-direction vector and the rotated club vector are both produced by
/// rotating it. Matches the NWU convention (X = North/forward).
pub const FORWARD: Vector3<f32> = Vector3::new(1.0, 0.0, 0.0);

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;

    /// Project into the horizontal plane (zero the vertical component)
    fn horizontal(&self) -> Vector3<f32>;

    /// Convert degrees to radians
    fn deg_to_rad(&self) -> Vector3<f32>;

    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn safe_normalize(&self) -> Vector3<f32> {
        let mag = self.norm();
        if mag > 0.0 { *self / mag } else { Vector3::zeros() }
    }

    fn horizontal(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, 0.0)
    }

    fn deg_to_rad(&self) -> Vector3<f32> {
        *self * DEG_TO_RAD
    }

    fn rad_to_deg(&self) -> Vector3<f32> {
        *self * RAD_TO_DEG
    }
}

/// Extension trait for UnitQuaternion operations
pub trait QuaternionExt {
    /// Convert quaternion to Euler angles (roll, pitch, yaw) in radians
    fn to_euler(&self) -> Vector3<f32>;

    /// Convert quaternion to Euler angles in degrees
    fn to_euler_degrees(&self) -> Vector3<f32>;

    /// Create quaternion from Euler angles in radians
    fn from_euler(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32>;

    /// Create quaternion from Euler angles in degrees
    fn from_euler_degrees(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32>;
}

impl QuaternionExt for UnitQuaternion<f32> {
    fn to_euler(&self) -> Vector3<f32> {
        let (roll, pitch, yaw) = self.euler_angles();
        Vector3::new(roll, pitch, yaw)
    }

    fn to_euler_degrees(&self) -> Vector3<f32> {
        self.to_euler().rad_to_deg()
    }

    fn from_euler(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(roll, pitch, yaw)
    }

    fn from_euler_degrees(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32> {
        let euler_rad = Vector3::new(roll, pitch, yaw).deg_to_rad();
        Self::from_euler(euler_rad.x, euler_rad.y, euler_rad.z)
    }
}
