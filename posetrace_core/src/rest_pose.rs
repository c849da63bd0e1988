//! Rest-pose constants: per-joint starting rotations.

use nalgebra::{UnitQuaternion, Vector3};

/// Baseline Euler angles (degrees) of each joint in the rest pose.
///
/// Constant; composed under the global yaw for the rotated joint subset.
pub const STARTING_ROTATIONS: [(&str, [f64; 3]); 14] = [
    ("Hips", [0.0, 0.0, 0.0]),
    ("RAnkle", [297.479553, 354.272217, 186.450226]),
    ("RKnee", [2.80536222, 359.983734, 179.671234]),
    ("LAnkle", [297.478546, 5.70809603, 173.571609]),
    ("LKnee", [2.80462027, 0.0164177921, 180.338806]),
    ("RHand", [90.0, 89.9997406, 0.0]),
    ("RElbow", [90.0, 89.999733, 0.0]),
    ("RShoulder", [90.0, 89.9997406, 0.0]),
    ("LHand", [90.0, 269.999725, 0.0]),
    ("LElbow", [90.0, 269.999756, 0.0]),
    ("LShoulder", [90.0, 269.999725, 0.0]),
    ("LHip", [0.72649169, -0.00448312704, 179.659653]),
    ("RHip", [0.725743175, 0.00427764142, 180.350372]),
    ("Head", [0.0, 0.0, 0.0]),
];

/// Euler angles of `joint` in the rest pose, if it has a baseline.
pub fn starting_euler(joint: &str) -> Option<Vector3<f64>> {
    STARTING_ROTATIONS
        .iter()
        .find(|(name, _)| *name == joint)
        .map(|(_, [x, y, z])| Vector3::new(*x, *y, *z))
}

/// Rest rotation of `joint`, if it has a baseline.
pub fn starting_rotation(joint: &str) -> Option<UnitQuaternion<f64>> {
    starting_euler(joint).map(|e| euler_degrees(e.x, e.y, e.z))
}

/// Rotation from Euler angles in degrees, applied about Z, then X, then Y.
///
/// Equivalent to `Ry(y) * Rx(x) * Rz(z)`.
pub fn euler_degrees(x: f64, y: f64, z: f64) -> UnitQuaternion<f64> {
    let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x.to_radians());
    let ry = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y.to_radians());
    let rz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z.to_radians());
    ry * rx * rz
}

/// Rotation about the vertical (Y) axis.
pub fn yaw_degrees(yaw: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw.to_radians())
}
