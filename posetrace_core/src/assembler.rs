//! The Pose Assembler - rebuilds one skeleton pose from one frame of samples.
//!
//! Pipeline for frame F:
//! 1. Reset the skeleton to its rest pose
//! 2. Write every non-zero mapped sample of F into the joints of that name
//! 3. Hips = midpoint of RHip and LHip (when both observed)
//! 4. Head anchor: a Head still at the placeholder height is put above the hips
//! 5. Neck = Head
//! 6. Spine chain re-placed proportionally along Hips -> Head
//! 7. Global yaw from the hip direction
//! 8. Yaw composed onto the starting rotation of ankles, hips and head
//! 9. (deferred) hands copy their forearm's global rotation
//!
//! Every step tolerates missing joints and degenerate geometry: the problem
//! is logged, recorded in the [`FrameReport`], and the step is skipped.

use crate::config::ReplayConfig;
use crate::coords::CoordinateMapper;
use crate::error::PoseError;
use crate::rest_pose::{starting_rotation, yaw_degrees, STARTING_ROTATIONS};
use crate::sample_table::SampleTable;
use crate::skeleton::{joints, JointHandle, SkeletonInstance};
use nalgebra::Vector3;
use tracing::{debug, warn};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Head position an upstream estimator reports when it has no real estimate.
pub const HEAD_PLACEHOLDER: [f64; 3] = [0.0, 1.787, 0.0];

/// Componentwise tolerance for matching [`HEAD_PLACEHOLDER`].
pub const HEAD_PLACEHOLDER_TOLERANCE: f64 = 0.1;

/// Head offset above the hips used when the placeholder is detected.
pub const HEAD_ABOVE_HIPS: [f64; 3] = [0.0, 0.787, 0.0];

/// Hips-to-head length of the rest spine.
pub const SPINE_BASE_LENGTH: f64 = 0.6;

/// Cumulative rest distances from the hips along the spine.
pub const SPINE_REFERENCE: [(&str, f64); 4] = [
    (joints::SPINE0, 0.099),
    (joints::SPINE1, 0.216),
    (joints::SPINE2, 0.351),
    (joints::NECK, 0.499),
];

/// Joints that receive the global yaw.
pub const YAW_JOINTS: [&str; 4] = [joints::RANKLE, joints::LANKLE, joints::HIPS, joints::HEAD];

/// (forearm, hand) pairs for the deferred hand pass.
pub const HAND_CHAIN: [(&str, &str); 2] = [
    (joints::RFOREARM, joints::RHAND),
    (joints::LFOREARM, joints::LHAND),
];

/// Displacement below which a joint counts as static between two frames.
pub const STATIC_JOINT_EPSILON: f64 = 1e-4;

fn vec3(v: [f64; 3]) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2])
}

// ============================================================================
// FRAME REPORT
// ============================================================================

/// Outcome of assembling one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: i64,

    /// Samples written into at least one joint
    pub applied: usize,

    /// Samples skipped because they mapped to exactly zero
    pub excluded_zero: usize,

    /// Samples whose joint name matched nothing in the skeleton
    pub unmatched: usize,

    /// Head was moved above the hips by the placeholder heuristic
    pub head_anchored: bool,

    /// Global yaw in degrees, if it could be derived
    pub yaw_degrees: Option<f64>,

    /// Recoverable problems, in the order they occurred
    pub issues: Vec<PoseError>,
}

impl FrameReport {
    fn new(frame: i64) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    fn record(&mut self, issue: PoseError) {
        warn!("Frame {}: {}", self.frame, issue);
        self.issues.push(issue);
    }

    /// True when no step had to be skipped.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A frame whose primary pose is applied but whose hand pass is still due.
///
/// Must be finished against the same skeleton once steps 1-8 have settled.
#[must_use = "the hand pass only runs when the pending pose is finished"]
#[derive(Debug)]
pub struct PendingPose {
    report: FrameReport,
    debug_logging: bool,
}

impl PendingPose {
    pub fn frame(&self) -> i64 {
        self.report.frame
    }

    /// Report of steps 1-8.
    pub fn report(&self) -> &FrameReport {
        &self.report
    }

    /// Runs the hand pass: each hand's local rotation becomes its forearm's
    /// global rotation (no starting-rotation offset).
    pub fn finish<S: SkeletonInstance + ?Sized>(mut self, skeleton: &mut S) -> FrameReport {
        for (forearm_name, hand_name) in HAND_CHAIN {
            let Some(forearm) = skeleton.joint(forearm_name) else {
                self.report.record(PoseError::missing(forearm_name));
                continue;
            };
            let Some(hand) = skeleton.joint(hand_name) else {
                self.report.record(PoseError::missing(hand_name));
                continue;
            };
            let rotation = skeleton.global_rotation(forearm);
            skeleton.set_local_rotation(hand, rotation);
        }

        if self.debug_logging {
            debug!("Frame {}: hand rotations updated", self.report.frame);
        }
        self.report
    }
}

// ============================================================================
// POSE ASSEMBLER
// ============================================================================

/// Stateless per-frame pose builder.
///
/// Holds only configuration constants, so assembling the same frame of the
/// same table twice yields the same pose.
#[derive(Debug, Clone)]
pub struct PoseAssembler {
    mapper: CoordinateMapper,
    debug_logging: bool,
    fix_static_joints: bool,
}

/// Raw observations retained from step 2.
#[derive(Debug, Default)]
struct Observed {
    rhip: Option<Vector3<f64>>,
    lhip: Option<Vector3<f64>>,
    head: Option<Vector3<f64>>,
}

impl PoseAssembler {
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            mapper: CoordinateMapper::new(config.scale),
            debug_logging: config.debug_logging,
            fix_static_joints: config.fix_static_joints,
        }
    }

    /// Assembler with default options and the given scale.
    pub fn with_scale(scale: f64) -> Self {
        Self {
            mapper: CoordinateMapper::new(scale),
            debug_logging: false,
            fix_static_joints: false,
        }
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Applies steps 1-8 of `frame` to `skeleton`.
    ///
    /// The returned [`PendingPose`] carries the deferred hand pass.
    pub fn assemble<S: SkeletonInstance + ?Sized>(
        &self,
        frame: i64,
        table: &SampleTable,
        skeleton: &mut S,
    ) -> PendingPose {
        if self.debug_logging {
            debug!("Applying joint positions from frame {}", frame);
        }

        let mut report = FrameReport::new(frame);

        skeleton.reset_to_rest_pose();

        let observed = self.write_samples(frame, table, skeleton, &mut report);
        self.reconcile_hips(&observed, skeleton, &mut report);
        self.anchor_head(&observed, skeleton, &mut report);
        self.place_neck(skeleton, &mut report);
        if self.fix_static_joints {
            self.fix_static_joints(frame, table, skeleton);
        }
        let spine = self.place_spine(skeleton, &mut report);
        report.yaw_degrees = self.apply_yaw(skeleton, &mut report);
        // yawing Hips swings its children; spine targets are world-space
        for (joint, target) in spine {
            skeleton.set_global_position(joint, target);
        }

        PendingPose {
            report,
            debug_logging: self.debug_logging,
        }
    }

    /// Assembles `frame` and runs the hand pass immediately after.
    pub fn assemble_now<S: SkeletonInstance + ?Sized>(
        &self,
        frame: i64,
        table: &SampleTable,
        skeleton: &mut S,
    ) -> FrameReport {
        self.assemble(frame, table, skeleton).finish(skeleton)
    }

    fn write_samples<S: SkeletonInstance + ?Sized>(
        &self,
        frame: i64,
        table: &SampleTable,
        skeleton: &mut S,
        report: &mut FrameReport,
    ) -> Observed {
        let mut observed = Observed::default();

        for sample in table.samples_for(frame) {
            let position = self.mapper.map(sample.position);
            // exact zero means "not observed"
            if position == Vector3::zeros() {
                report.excluded_zero += 1;
                continue;
            }

            let targets = skeleton.joints_named(&sample.joint_name);
            if targets.is_empty() {
                report.unmatched += 1;
                if self.debug_logging {
                    debug!("Frame {}: no joint named {:?}", frame, sample.joint_name);
                }
                continue;
            }
            for joint in targets {
                skeleton.set_local_position(joint, position);
            }
            report.applied += 1;

            match sample.joint_name.as_str() {
                joints::RHIP => observed.rhip = Some(position),
                joints::LHIP => observed.lhip = Some(position),
                joints::HEAD => observed.head = Some(position),
                _ => {}
            }
        }

        observed
    }

    fn reconcile_hips<S: SkeletonInstance + ?Sized>(
        &self,
        observed: &Observed,
        skeleton: &mut S,
        report: &mut FrameReport,
    ) {
        let (Some(rhip), Some(lhip)) = (observed.rhip, observed.lhip) else {
            return;
        };
        match skeleton.joint(joints::HIPS) {
            Some(hips) => skeleton.set_local_position(hips, (rhip + lhip) / 2.0),
            None => report.record(PoseError::missing(joints::HIPS)),
        }
    }

    fn anchor_head<S: SkeletonInstance + ?Sized>(
        &self,
        observed: &Observed,
        skeleton: &mut S,
        report: &mut FrameReport,
    ) {
        let Some(head) = skeleton.joint(joints::HEAD) else {
            report.record(PoseError::missing(joints::HEAD));
            return;
        };

        let offset = skeleton.local_position(head) - vec3(HEAD_PLACEHOLDER);
        if offset.abs().max() >= HEAD_PLACEHOLDER_TOLERANCE {
            return;
        }

        match skeleton.joint(joints::HIPS) {
            Some(hips) => {
                if self.debug_logging {
                    match observed.head {
                        Some(sample) => debug!(
                            "Frame {}: head sample {:?} is a placeholder, setting head above hips",
                            report.frame, sample
                        ),
                        None => debug!("Frame {}: head not observed, setting head above hips", report.frame),
                    }
                }
                let anchored = vec3(HEAD_ABOVE_HIPS) + skeleton.local_position(hips);
                skeleton.set_local_position(head, anchored);
                report.head_anchored = true;
            }
            None => report.record(PoseError::missing(joints::HIPS)),
        }
    }

    fn place_neck<S: SkeletonInstance + ?Sized>(&self, skeleton: &mut S, report: &mut FrameReport) {
        let Some(head) = skeleton.joint(joints::HEAD) else {
            return;
        };
        let Some(neck) = skeleton.joint(joints::NECK) else {
            report.record(PoseError::missing(joints::NECK));
            return;
        };
        let head_position = skeleton.local_position(head);
        skeleton.set_local_position(neck, head_position);
    }

    /// Translates joints whose raw sample did not move since the previous
    /// frame by the hips' raw motion over the same interval.
    fn fix_static_joints<S: SkeletonInstance + ?Sized>(
        &self,
        frame: i64,
        table: &SampleTable,
        skeleton: &mut S,
    ) {
        if frame <= 2 {
            return;
        }
        let mapped = |f: i64, name: &str| table.sample_at(f, name).map(|s| self.mapper.map(s.position));

        let (Some(prev_hips), Some(curr_hips)) = (mapped(frame - 1, joints::HIPS), mapped(frame, joints::HIPS))
        else {
            return;
        };
        let hips_delta = curr_hips - prev_hips;

        for (name, _) in STARTING_ROTATIONS {
            let Some(joint) = skeleton.joint(name) else {
                continue;
            };
            let (Some(prev), Some(curr)) = (mapped(frame - 1, name), mapped(frame, name)) else {
                continue;
            };
            if (curr - prev).norm() < STATIC_JOINT_EPSILON {
                let moved = skeleton.local_position(joint) + hips_delta;
                skeleton.set_local_position(joint, moved);
            }
        }
    }

    /// Re-places the spine chain along the Hips -> Head segment, keeping the
    /// rest proportions of each segment. Returns the global targets, parents
    /// first.
    fn place_spine<S: SkeletonInstance + ?Sized>(
        &self,
        skeleton: &mut S,
        report: &mut FrameReport,
    ) -> Vec<(JointHandle, Vector3<f64>)> {
        let mut placed = Vec::with_capacity(SPINE_REFERENCE.len());
        let Some(hips) = skeleton.joint(joints::HIPS) else {
            report.record(PoseError::missing(joints::HIPS));
            return placed;
        };
        let Some(head) = skeleton.joint(joints::HEAD) else {
            report.record(PoseError::missing(joints::HEAD));
            return placed;
        };

        let hips_position = skeleton.global_position(hips);
        let spine = skeleton.global_position(head) - hips_position;
        let length = spine.norm();
        if length == 0.0 {
            report.record(PoseError::degenerate("hips and head coincide, spine not placed"));
            return placed;
        }

        let direction = spine / length;
        let ratio = length / SPINE_BASE_LENGTH;

        for (name, distance) in SPINE_REFERENCE {
            match skeleton.joint(name) {
                Some(joint) => {
                    let target = hips_position + direction * (distance * ratio);
                    skeleton.set_global_position(joint, target);
                    placed.push((joint, target));
                }
                None => report.record(PoseError::missing(name)),
            }
        }
        placed
    }

    /// Derives the yaw from RHip - LHip and applies it to [`YAW_JOINTS`].
    fn apply_yaw<S: SkeletonInstance + ?Sized>(
        &self,
        skeleton: &mut S,
        report: &mut FrameReport,
    ) -> Option<f64> {
        let (Some(rhip), Some(lhip)) = (skeleton.joint(joints::RHIP), skeleton.joint(joints::LHIP))
        else {
            report.record(PoseError::missing("RHip or LHip"));
            return None;
        };

        let direction = skeleton.local_position(rhip) - skeleton.local_position(lhip);
        if direction == Vector3::zeros() {
            report.record(PoseError::degenerate("RHip and LHip positions are identical"));
            return None;
        }

        let yaw = -direction.z.atan2(direction.x).to_degrees();
        let overall = yaw_degrees(yaw);

        for name in YAW_JOINTS {
            let (Some(joint), Some(base)) = (skeleton.joint(name), starting_rotation(name)) else {
                report.record(PoseError::missing(name));
                continue;
            };
            skeleton.set_local_rotation(joint, overall * base);
        }

        if self.debug_logging {
            debug!("Frame {}: applied overall Y rotation ({:.3} deg)", report.frame, yaw);
        }
        Some(yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::{Rig, RigDefinition};
    use crate::sample_table::RawSample;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    /// Raw sample whose mapped position (scale 1000) equals `target`.
    fn at(frame: i64, joint: &str, target: [f64; 3]) -> RawSample {
        RawSample::new(
            frame,
            joint,
            Vector3::new(target[0] * 1000.0, target[2] * 1000.0, target[1] * 1000.0),
        )
    }

    fn assembler() -> PoseAssembler {
        PoseAssembler::with_scale(1000.0)
    }

    fn local(rig: &Rig, name: &str) -> Vector3<f64> {
        rig.local_position(rig.joint(name).unwrap())
    }

    fn global(rig: &Rig, name: &str) -> Vector3<f64> {
        rig.global_position(rig.joint(name).unwrap())
    }

    #[test]
    fn test_zero_sample_is_not_an_observation() {
        let table = SampleTable::from_samples([
            at(2, joints::RKNEE, [0.0, 0.0, 0.0]),
            at(2, joints::LKNEE, [-0.1, 0.5, 0.05]),
        ]);
        let mut rig = Rig::humanoid();
        let rest = local(&rig, joints::RKNEE);

        let report = assembler().assemble_now(2, &table, &mut rig);

        assert_eq!(local(&rig, joints::RKNEE), rest);
        assert_relative_eq!(local(&rig, joints::LKNEE), Vector3::new(-0.1, 0.5, 0.05), epsilon = 1e-12);
        assert_eq!(report.excluded_zero, 1);
        assert_eq!(report.applied, 1);
    }

    #[test]
    fn test_zero_hip_blocks_reconciliation() {
        let table = SampleTable::from_samples([
            at(2, joints::RHIP, [0.1, 0.9, 0.0]),
            at(2, joints::LHIP, [0.0, 0.0, 0.0]),
        ]);
        let mut rig = Rig::humanoid();
        let rest_hips = local(&rig, joints::HIPS);

        let _ = assembler().assemble_now(2, &table, &mut rig);

        assert_eq!(local(&rig, joints::HIPS), rest_hips);
    }

    #[test]
    fn test_hips_midpoint() {
        let table = SampleTable::from_samples([
            at(4, joints::RHIP, [1.0, 0.0, 0.0]),
            at(4, joints::LHIP, [-1.0, 0.0, 0.0]),
        ]);
        let mut rig = Rig::humanoid();

        let report = assembler().assemble_now(4, &table, &mut rig);

        assert_relative_eq!(local(&rig, joints::HIPS), Vector3::zeros(), epsilon = 1e-12);
        assert_eq!(report.yaw_degrees, Some(0.0));
    }

    #[test]
    fn test_head_anchor_replaces_placeholder() {
        let table = SampleTable::from_samples([
            at(2, joints::RHIP, [1.0, 0.0, 0.0]),
            at(2, joints::LHIP, [-1.0, 0.0, 0.0]),
            at(2, joints::HEAD, [0.02, 1.80, -0.03]),
        ]);
        let mut rig = Rig::humanoid();

        let report = assembler().assemble_now(2, &table, &mut rig);

        assert_relative_eq!(local(&rig, joints::HEAD), Vector3::new(0.0, 0.787, 0.0), epsilon = 1e-9);
        assert!(report.head_anchored);
    }

    #[test]
    fn test_head_outside_tolerance_is_kept() {
        let table = SampleTable::from_samples([at(2, joints::HEAD, [0.3, 1.75, 0.0])]);
        let mut rig = Rig::humanoid();

        let report = assembler().assemble_now(2, &table, &mut rig);

        assert_relative_eq!(local(&rig, joints::HEAD), Vector3::new(0.3, 1.75, 0.0), epsilon = 1e-9);
        assert!(!report.head_anchored);
    }

    #[test]
    fn test_unobserved_head_sits_above_hips() {
        let table = SampleTable::from_samples([
            at(2, joints::RHIP, [0.6, 0.9, 0.0]),
            at(2, joints::LHIP, [0.4, 0.9, 0.0]),
        ]);
        let mut rig = Rig::humanoid();

        let _ = assembler().assemble_now(2, &table, &mut rig);

        assert_relative_eq!(local(&rig, joints::HEAD), Vector3::new(0.5, 1.687, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_spine_is_placed_proportionally() {
        let table = SampleTable::from_samples([
            at(2, joints::RHIP, [1.0, 0.0, 0.0]),
            at(2, joints::LHIP, [-1.0, 0.0, 0.0]),
            at(2, joints::HEAD, [0.0, 1.2, 0.0]),
        ]);
        let mut rig = Rig::humanoid();

        let report = assembler().assemble_now(2, &table, &mut rig);

        assert!(report.is_clean(), "{:?}", report.issues);
        assert_relative_eq!(global(&rig, joints::SPINE0), Vector3::new(0.0, 0.198, 0.0), epsilon = 1e-9);
        assert_relative_eq!(global(&rig, joints::SPINE1), Vector3::new(0.0, 0.432, 0.0), epsilon = 1e-9);
        assert_relative_eq!(global(&rig, joints::SPINE2), Vector3::new(0.0, 0.702, 0.0), epsilon = 1e-9);
        assert_relative_eq!(global(&rig, joints::NECK), Vector3::new(0.0, 0.998, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_spine_follows_tilted_segment() {
        let table = SampleTable::from_samples([
            at(2, joints::RHIP, [1.0, 0.0, 0.0]),
            at(2, joints::LHIP, [-1.0, 0.0, 0.0]),
            at(2, joints::HEAD, [0.36, 0.48, 0.0]),
        ]);
        let mut rig = Rig::humanoid();

        let _ = assembler().assemble_now(2, &table, &mut rig);

        // length 0.6 keeps the rest distances, direction (0.6, 0.8, 0)
        assert_relative_eq!(
            global(&rig, joints::SPINE1),
            Vector3::new(0.6, 0.8, 0.0) * 0.216,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_spine_stays_on_segment_under_yaw() {
        let table = SampleTable::from_samples([
            at(2, joints::RHIP, [0.0, 0.9, -0.1]),
            at(2, joints::LHIP, [0.0, 0.9, 0.1]),
            at(2, joints::HEAD, [0.36, 1.38, 0.0]),
        ]);
        let mut rig = Rig::humanoid();

        let report = assembler().assemble_now(2, &table, &mut rig);

        assert_relative_eq!(report.yaw_degrees.unwrap(), 90.0, epsilon = 1e-9);
        // hips (0, 0.9, 0), segment direction (0.6, 0.8, 0), length 0.6
        let hips = Vector3::new(0.0, 0.9, 0.0);
        let direction = Vector3::new(0.6, 0.8, 0.0);
        for (name, distance) in SPINE_REFERENCE {
            assert_relative_eq!(global(&rig, name), hips + direction * distance, epsilon = 1e-9);
        }
        assert_relative_eq!(global(&rig, joints::SPINE1), Vector3::new(0.1296, 1.0728, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_yaw_from_hip_direction() {
        let table = SampleTable::from_samples([
            at(2, joints::RHIP, [0.0, 0.9, -0.1]),
            at(2, joints::LHIP, [0.0, 0.9, 0.1]),
        ]);
        let mut rig = Rig::humanoid();

        let report = assembler().assemble_now(2, &table, &mut rig);

        // direction (0, 0, -0.2): -atan2(-0.2, 0) = +90 degrees
        assert_relative_eq!(report.yaw_degrees.unwrap(), 90.0, epsilon = 1e-9);
        let hips = rig.joint(joints::HIPS).unwrap();
        let expected = yaw_degrees(90.0) * starting_rotation(joints::HIPS).unwrap();
        assert_relative_eq!(rig.local_rotation(hips), expected, epsilon = 1e-9);

        let ankle = rig.joint(joints::RANKLE).unwrap();
        let expected = yaw_degrees(90.0) * starting_rotation(joints::RANKLE).unwrap();
        assert_relative_eq!(rig.local_rotation(ankle), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_yaw_degenerate_leaves_rotations() {
        let table = SampleTable::from_samples([
            at(2, joints::RHIP, [0.2, 0.9, 0.1]),
            at(2, joints::LHIP, [0.2, 0.9, 0.1]),
        ]);
        let mut rig = Rig::humanoid();
        let before: Vec<UnitQuaternion<f64>> = YAW_JOINTS
            .iter()
            .map(|n| rig.local_rotation(rig.joint(n).unwrap()))
            .collect();

        let report = assembler().assemble_now(2, &table, &mut rig);

        let after: Vec<UnitQuaternion<f64>> = YAW_JOINTS
            .iter()
            .map(|n| rig.local_rotation(rig.joint(n).unwrap()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(report.yaw_degrees, None);
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, PoseError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_hands_copy_forearm_global_rotation() {
        let table = SampleTable::from_samples([
            at(2, joints::RHIP, [0.0, 0.9, -0.1]),
            at(2, joints::LHIP, [0.0, 0.9, 0.1]),
        ]);
        let mut rig = Rig::humanoid();

        let pending = assembler().assemble(2, &table, &mut rig);
        let rhand = rig.joint(joints::RHAND).unwrap();
        let rest_hand = rig.local_rotation(rhand);
        assert_eq!(rest_hand, starting_rotation(joints::RHAND).unwrap());

        let report = pending.finish(&mut rig);

        assert!(report.is_clean(), "{:?}", report.issues);
        let forearm = rig.joint(joints::RFOREARM).unwrap();
        assert_relative_eq!(rig.local_rotation(rhand), rig.global_rotation(forearm), epsilon = 1e-12);
        let lhand = rig.joint(joints::LHAND).unwrap();
        let lforearm = rig.joint(joints::LFOREARM).unwrap();
        assert_relative_eq!(rig.local_rotation(lhand), rig.global_rotation(lforearm), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_joints_are_skipped() {
        let mut def = RigDefinition::new();
        def.add_joint(joints::HIPS, None, Vector3::new(0.0, 1.0, 0.0), UnitQuaternion::identity())
            .unwrap();
        def.add_joint(joints::HEAD, None, Vector3::new(0.0, 1.6, 0.0), UnitQuaternion::identity())
            .unwrap();
        let mut rig = Rig::new(def);
        let table = SampleTable::from_samples([
            at(2, joints::HEAD, [0.0, 1.5, 0.2]),
            at(2, "Nose", [0.0, 1.55, 0.25]),
        ]);

        let report = assembler().assemble_now(2, &table, &mut rig);

        assert_relative_eq!(local(&rig, joints::HEAD), Vector3::new(0.0, 1.5, 0.2), epsilon = 1e-12);
        assert_eq!(report.unmatched, 1);
        assert!(report.issues.contains(&PoseError::missing(joints::SPINE0)));
        assert!(report.issues.contains(&PoseError::missing(joints::RFOREARM)));
        assert!(report.yaw_degrees.is_none());
    }

    #[test]
    fn test_reassembly_is_idempotent() {
        let table = SampleTable::from_samples([
            at(3, joints::RHIP, [0.15, 0.92, 0.04]),
            at(3, joints::LHIP, [-0.05, 0.93, -0.02]),
            at(3, joints::HEAD, [0.05, 1.55, 0.1]),
            at(3, joints::RKNEE, [0.14, 0.5, 0.1]),
            at(4, joints::RKNEE, [0.4, 0.5, 0.3]),
        ]);
        let mut rig = Rig::humanoid();
        let asm = assembler();

        let _ = asm.assemble_now(3, &table, &mut rig);
        let first: Vec<Vector3<f64>> = rig.handles().map(|(h, _)| rig.global_position(h)).collect();

        let _ = asm.assemble_now(4, &table, &mut rig);
        let _ = asm.assemble_now(3, &table, &mut rig);
        let second: Vec<Vector3<f64>> = rig.handles().map(|(h, _)| rig.global_position(h)).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_last_sample_in_frame_wins() {
        let table = SampleTable::from_samples([
            at(2, joints::RKNEE, [0.1, 0.5, 0.0]),
            at(2, joints::RKNEE, [0.2, 0.4, 0.0]),
        ]);
        let mut rig = Rig::humanoid();

        let _ = assembler().assemble_now(2, &table, &mut rig);

        assert_relative_eq!(local(&rig, joints::RKNEE), Vector3::new(0.2, 0.4, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_static_joint_follows_hips_when_enabled() {
        let table = SampleTable::from_samples([
            at(2, joints::HIPS, [0.0, 1.0, 0.0]),
            at(2, joints::RKNEE, [0.1, 0.5, 0.0]),
            at(3, joints::HIPS, [0.2, 1.0, 0.0]),
            at(3, joints::RKNEE, [0.1, 0.5, 0.0]),
        ]);
        let config = ReplayConfig {
            fix_static_joints: true,
            ..ReplayConfig::default()
        };
        let mut rig = Rig::humanoid();

        let _ = PoseAssembler::new(&config).assemble_now(3, &table, &mut rig);
        assert_relative_eq!(local(&rig, joints::RKNEE), Vector3::new(0.3, 0.5, 0.0), epsilon = 1e-9);

        let _ = assembler().assemble_now(3, &table, &mut rig);
        assert_relative_eq!(local(&rig, joints::RKNEE), Vector3::new(0.1, 0.5, 0.0), epsilon = 1e-9);
    }
}
