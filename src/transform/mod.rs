//! Access to the robot's transform tree.
//!
//! The transform tree itself is an external collaborator; this module
//! defines the trait through which it is consumed, plus the conversions the
//! behavior needs. Implementations are expected to wait a bounded amount of
//! time (see [`TF_LOOKUP_TIMEOUT`]) before reporting a lookup as
//! unavailable.

use nalgebra::{UnitQuaternion, Vector3};
use std::time::Duration;

use crate::geometry::Pose;

/// The global reference frame used for destination selection.
pub const MAP_FRAME: &str = "map";

/// Assumed height of the human's face above the ground (meters). When a
/// human transform is converted to a pose, its vertical component is
/// replaced by this constant: the relevant interaction point is the
/// person's head, not their frame origin.
pub const FACE_HEIGHT_M: f64 = 1.5;

/// Upper bound on waiting for a transform to become available.
pub const TF_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// A rigid translation + rotation mapping one frame to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Translation component (meters)
    pub translation: Vector3<f64>,
    /// Rotation component (unit quaternion)
    pub rotation: UnitQuaternion<f64>,
}

/// Transform lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// No valid transform between the two frames could be produced before
    /// the timeout (broken chain, unknown frame or stale data).
    Unavailable {
        /// Frame whose pose was requested
        frame: String,
        /// Frame the pose was requested in
        reference: String,
    },
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TransformError::Unavailable { frame, reference } => {
                write!(f, "transform of '{}' in '{}' unavailable", frame, reference)
            }
        }
    }
}

impl std::error::Error for TransformError {}

/// Source of rigid transforms between named frames.
///
/// `lookup(frame, reference)` returns the transform expressing `frame`
/// relative to `reference`, waiting at most [`TF_LOOKUP_TIMEOUT`] for it to
/// become available.
pub trait TransformProvider {
    /// Look up the transform of `frame` expressed in `reference`.
    fn lookup(&self, frame: &str, reference: &str) -> Result<Transform, TransformError>;
}

/// Look up a transform, optionally inverted (the pose of `reference`
/// expressed in `frame` instead).
pub fn resolve<T: TransformProvider + ?Sized>(
    provider: &T,
    frame: &str,
    reference: &str,
    invert: bool,
) -> Result<Transform, TransformError> {
    if invert {
        provider.lookup(reference, frame)
    } else {
        provider.lookup(frame, reference)
    }
}

/// Convert a resolved transform into a pose, overriding the vertical
/// component with the assumed face height.
pub fn transform_to_pose(transform: &Transform) -> Pose {
    let mut pose = Pose::new(
        transform.translation.into(),
        transform.rotation,
    );
    pose.position.z = FACE_HEIGHT_M;
    pose
}

/// Resolve the pose of `frame` expressed in `reference`.
pub fn resolve_pose<T: TransformProvider + ?Sized>(
    provider: &T,
    frame: &str,
    reference: &str,
) -> Result<Pose, TransformError> {
    provider.lookup(frame, reference).map(|t| transform_to_pose(&t))
}

/// Resolve the pose of `frame` in the global map frame.
pub fn resolve_in_map<T: TransformProvider + ?Sized>(
    provider: &T,
    frame: &str,
) -> Result<Pose, TransformError> {
    resolve_pose(provider, frame, MAP_FRAME)
}
