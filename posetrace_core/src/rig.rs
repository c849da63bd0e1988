//! In-memory transform hierarchy implementing [`SkeletonInstance`].
//!
//! A `RigDefinition` is the immutable "prefab": names, parents and rest
//! transforms. A `Rig` is one posable instance of it. Resetting a rig copies
//! the rest transforms back, which is equivalent to destroying and
//! re-instantiating it.

use crate::error::PoseError;
use crate::rest_pose::starting_rotation;
use crate::skeleton::{joints, JointHandle, SkeletonInstance};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the root joint of [`RigDefinition::humanoid`].
pub const ROOT: &str = "Person";

/// One joint of a rig definition.
#[derive(Debug, Clone)]
pub struct RigJoint {
    pub name: String,

    /// Index of the parent joint, `None` for roots
    pub parent: Option<usize>,

    /// Rest position relative to the parent
    pub rest_position: Vector3<f64>,

    /// Rest rotation relative to the parent
    pub rest_rotation: UnitQuaternion<f64>,
}

/// Immutable joint hierarchy with rest transforms.
///
/// Parents are always declared before their children.
#[derive(Debug, Clone, Default)]
pub struct RigDefinition {
    joints: Vec<RigJoint>,
}

impl RigDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a joint under `parent` (looked up by name, last match wins).
    pub fn add_joint(
        &mut self,
        name: &str,
        parent: Option<&str>,
        rest_position: Vector3<f64>,
        rest_rotation: UnitQuaternion<f64>,
    ) -> Result<JointHandle, PoseError> {
        let parent = match parent {
            Some(parent_name) => Some(
                self.joints
                    .iter()
                    .rposition(|j| j.name == parent_name)
                    .ok_or_else(|| PoseError::missing(parent_name))?,
            ),
            None => None,
        };

        self.joints.push(RigJoint {
            name: name.to_string(),
            parent,
            rest_position,
            rest_rotation,
        });
        Ok(JointHandle(self.joints.len() - 1))
    }

    pub fn joints(&self) -> &[RigJoint] {
        &self.joints
    }

    /// Standing humanoid laid out as IK targets under a `Person` root.
    ///
    /// Tracked joints hang directly off the root so that trajectory samples
    /// (root-relative positions) can be written as local positions. The spine
    /// chain `Hips -> Spine0 -> Spine1 -> Spine2 -> Neck` and the forearms
    /// (children of the elbows) are real chains. Rest rotations come from the
    /// starting-rotation table.
    pub fn humanoid() -> Self {
        use joints::*;

        // (name, parent, rest position)
        let layout: [(&str, &str, [f64; 3]); 20] = [
            (HIPS, ROOT, [0.0, 1.0, 0.0]),
            (SPINE0, HIPS, [0.0, 0.099, 0.0]),
            (SPINE1, SPINE0, [0.0, 0.117, 0.0]),
            (SPINE2, SPINE1, [0.0, 0.135, 0.0]),
            (NECK, SPINE2, [0.0, 0.148, 0.0]),
            (HEAD, ROOT, [0.0, 1.787, 0.0]),
            (RHIP, ROOT, [0.09, 0.95, 0.0]),
            (LHIP, ROOT, [-0.09, 0.95, 0.0]),
            (RKNEE, ROOT, [0.09, 0.52, 0.0]),
            (LKNEE, ROOT, [-0.09, 0.52, 0.0]),
            (RANKLE, ROOT, [0.09, 0.08, 0.0]),
            (LANKLE, ROOT, [-0.09, 0.08, 0.0]),
            (RSHOULDER, ROOT, [0.18, 1.45, 0.0]),
            (LSHOULDER, ROOT, [-0.18, 1.45, 0.0]),
            (RELBOW, ROOT, [0.46, 1.45, 0.0]),
            (LELBOW, ROOT, [-0.46, 1.45, 0.0]),
            (RFOREARM, RELBOW, [0.0, 0.13, 0.0]),
            (LFOREARM, LELBOW, [0.0, 0.13, 0.0]),
            (RHAND, ROOT, [0.72, 1.45, 0.0]),
            (LHAND, ROOT, [-0.72, 1.45, 0.0]),
        ];

        let mut def = Self::new();
        def.joints.push(RigJoint {
            name: ROOT.to_string(),
            parent: None,
            rest_position: Vector3::zeros(),
            rest_rotation: UnitQuaternion::identity(),
        });

        for (name, parent, [x, y, z]) in layout {
            let parent = def.joints.iter().rposition(|j| j.name == parent);
            def.joints.push(RigJoint {
                name: name.to_string(),
                parent,
                rest_position: Vector3::new(x, y, z),
                rest_rotation: starting_rotation(name).unwrap_or_else(UnitQuaternion::identity),
            });
        }
        def
    }
}

/// A posable instance of a [`RigDefinition`].
#[derive(Debug, Clone)]
pub struct Rig {
    definition: Arc<RigDefinition>,
    positions: Vec<Vector3<f64>>,
    rotations: Vec<UnitQuaternion<f64>>,

    /// name -> joint indices in declaration order
    index: HashMap<String, Vec<usize>>,
}

impl Rig {
    pub fn new(definition: RigDefinition) -> Self {
        Self::from_shared(Arc::new(definition))
    }

    /// Instantiates a definition shared with other rigs.
    pub fn from_shared(definition: Arc<RigDefinition>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, joint) in definition.joints.iter().enumerate() {
            index.entry(joint.name.clone()).or_default().push(i);
        }

        let positions = definition.joints.iter().map(|j| j.rest_position).collect();
        let rotations = definition.joints.iter().map(|j| j.rest_rotation).collect();

        Self {
            definition,
            positions,
            rotations,
            index,
        }
    }

    /// A fresh instance of [`RigDefinition::humanoid`].
    pub fn humanoid() -> Self {
        Self::new(RigDefinition::humanoid())
    }

    pub fn definition(&self) -> &RigDefinition {
        &self.definition
    }

    pub fn joint_count(&self) -> usize {
        self.positions.len()
    }

    /// Handles and names of every joint, in declaration order.
    pub fn handles(&self) -> impl Iterator<Item = (JointHandle, &str)> + '_ {
        self.definition
            .joints
            .iter()
            .enumerate()
            .map(|(i, j)| (JointHandle(i), j.name.as_str()))
    }

    fn local_isometry(&self, idx: usize) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.positions[idx]), self.rotations[idx])
    }

    fn global_isometry(&self, idx: usize) -> Isometry3<f64> {
        let local = self.local_isometry(idx);
        match self.definition.joints[idx].parent {
            Some(parent) => self.global_isometry(parent) * local,
            None => local,
        }
    }
}

impl SkeletonInstance for Rig {
    fn joints_named(&self, name: &str) -> Vec<JointHandle> {
        self.index
            .get(name)
            .map(|ids| ids.iter().copied().map(JointHandle).collect())
            .unwrap_or_default()
    }

    fn local_position(&self, joint: JointHandle) -> Vector3<f64> {
        self.positions[joint.0]
    }

    fn set_local_position(&mut self, joint: JointHandle, position: Vector3<f64>) {
        self.positions[joint.0] = position;
    }

    fn local_rotation(&self, joint: JointHandle) -> UnitQuaternion<f64> {
        self.rotations[joint.0]
    }

    fn set_local_rotation(&mut self, joint: JointHandle, rotation: UnitQuaternion<f64>) {
        self.rotations[joint.0] = rotation;
    }

    fn global_position(&self, joint: JointHandle) -> Vector3<f64> {
        self.global_isometry(joint.0).translation.vector
    }

    fn set_global_position(&mut self, joint: JointHandle, position: Vector3<f64>) {
        let local = match self.definition.joints[joint.0].parent {
            Some(parent) => self
                .global_isometry(parent)
                .inverse_transform_point(&Point3::from(position))
                .coords,
            None => position,
        };
        self.positions[joint.0] = local;
    }

    fn global_rotation(&self, joint: JointHandle) -> UnitQuaternion<f64> {
        self.global_isometry(joint.0).rotation
    }

    fn reset_to_rest_pose(&mut self) {
        for (i, joint) in self.definition.joints.iter().enumerate() {
            self.positions[i] = joint.rest_position;
            self.rotations[i] = joint.rest_rotation;
        }
    }
}
