//! Skeleton Instance - the named-joint capability the pose assembler drives.
//!
//! The concrete hierarchy is an injected collaborator. The core only needs
//! name lookup, local/global position and rotation accessors, and a way to
//! return to the rest pose before each frame.

use nalgebra::{UnitQuaternion, Vector3};

/// Joint names understood by the pose assembler.
pub mod joints {
    pub const HIPS: &str = "Hips";
    pub const RHIP: &str = "RHip";
    pub const LHIP: &str = "LHip";
    pub const RKNEE: &str = "RKnee";
    pub const LKNEE: &str = "LKnee";
    pub const RANKLE: &str = "RAnkle";
    pub const LANKLE: &str = "LAnkle";
    pub const SPINE0: &str = "Spine0";
    pub const SPINE1: &str = "Spine1";
    pub const SPINE2: &str = "Spine2";
    pub const NECK: &str = "Neck";
    pub const HEAD: &str = "Head";
    pub const RSHOULDER: &str = "RShoulder";
    pub const LSHOULDER: &str = "LShoulder";
    pub const RELBOW: &str = "RElbow";
    pub const LELBOW: &str = "LElbow";
    pub const RFOREARM: &str = "RForearm";
    pub const LFOREARM: &str = "LForearm";
    pub const RHAND: &str = "RHand";
    pub const LHAND: &str = "LHand";

    /// The fixed joint-name set.
    pub const ALL: [&str; 20] = [
        HIPS, RHIP, LHIP, RKNEE, LKNEE, RANKLE, LANKLE, SPINE0, SPINE1, SPINE2, NECK, HEAD,
        RSHOULDER, LSHOULDER, RELBOW, LELBOW, RFOREARM, LFOREARM, RHAND, LHAND,
    ];
}

/// Opaque reference to one joint of a skeleton instance.
///
/// Only meaningful for the instance that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle(pub usize);

/// A posable named-joint hierarchy.
///
/// Local values are relative to the joint's parent; global values are in the
/// skeleton's root space.
pub trait SkeletonInstance {
    /// Every joint carrying `name`, in hierarchy order.
    fn joints_named(&self, name: &str) -> Vec<JointHandle>;

    /// Single-joint lookup. When several joints share a name the last one wins.
    fn joint(&self, name: &str) -> Option<JointHandle> {
        self.joints_named(name).last().copied()
    }

    fn local_position(&self, joint: JointHandle) -> Vector3<f64>;

    fn set_local_position(&mut self, joint: JointHandle, position: Vector3<f64>);

    fn local_rotation(&self, joint: JointHandle) -> UnitQuaternion<f64>;

    fn set_local_rotation(&mut self, joint: JointHandle, rotation: UnitQuaternion<f64>);

    /// Position in root space, derived from the parent chain.
    fn global_position(&self, joint: JointHandle) -> Vector3<f64>;

    /// Moves the joint so that its root-space position equals `position`.
    fn set_global_position(&mut self, joint: JointHandle, position: Vector3<f64>);

    /// Rotation in root space, derived from the parent chain.
    fn global_rotation(&self, joint: JointHandle) -> UnitQuaternion<f64>;

    /// Discards every pose change and returns to the rest pose.
    ///
    /// Handles obtained before a reset must not be reused after it.
    fn reset_to_rest_pose(&mut self);
}
