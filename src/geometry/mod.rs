//! Pure pose math for the approach behavior.
//!
//! Ring-point generation around the human, route-length accumulation and
//! facing-orientation computation. Everything here is deterministic and
//! performs no I/O; the orchestration layers build on these primitives.

use nalgebra::{Point3, UnitQuaternion};
use std::f64::consts::PI;

/// Position and orientation in some reference frame.
///
/// The frame is implicit from the producing call; callers are responsible
/// for tracking which frame a pose is expressed in.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pose {
    /// Position (meters)
    pub position: Point3<f64>,
    /// Orientation (unit quaternion)
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    /// Create a pose from a position and an orientation.
    pub fn new(position: Point3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Pose {
            position,
            orientation,
        }
    }

    /// Create a pose at the given position with the identity orientation.
    pub fn from_position(position: Point3<f64>) -> Self {
        Pose::new(position, UnitQuaternion::identity())
    }

    /// The identity pose (origin, no rotation).
    pub fn identity() -> Self {
        Pose::from_position(Point3::origin())
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let q = self.orientation.quaternion();
        write!(
            f,
            "{{position: {{x: {:.3}, y: {:.3}, z: {:.3}}}, orientation: {{x: {:.3}, y: {:.3}, z: {:.3}, w: {:.3}}}}}",
            self.position.x, self.position.y, self.position.z, q.i, q.j, q.k, q.w
        )
    }
}

/// An ordered sequence of poses describing a traversal from start to goal,
/// as returned by the external route planner.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Route {
    /// Poses to follow, in travel order
    pub poses: Vec<Pose>,
}

impl Route {
    /// Create a route from a sequence of poses.
    pub fn new(poses: Vec<Pose>) -> Self {
        Route { poses }
    }

    /// The final pose of the route, if any.
    pub fn end(&self) -> Option<&Pose> {
        self.poses.last()
    }
}

/// 2D Euclidean distance between two positions (z ignored, matching
/// ground-plane navigation).
pub fn distance_2d(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Generate `count` positions evenly spaced on a circle of `radius` around
/// `center` in the horizontal plane (z = 0), at angles `2*pi*i/count`.
pub fn ring_points(center: &Point3<f64>, radius: f64, count: usize) -> Vec<Point3<f64>> {
    (0..count)
        .map(|i| {
            let theta = 2.0 * PI * (i as f64) / (count as f64);
            Point3::new(
                center.x + radius * theta.cos(),
                center.y + radius * theta.sin(),
                0.0,
            )
        })
        .collect()
}

/// Length of a planned route: the sum of 2D distances between consecutive
/// poses. An absent or empty route has infinite length.
pub fn route_length(route: Option<&Route>) -> f64 {
    let poses = match route {
        Some(route) if !route.poses.is_empty() => &route.poses,
        _ => return f64::INFINITY,
    };
    poses
        .windows(2)
        .map(|pair| distance_2d(&pair[0].position, &pair[1].position))
        .sum()
}

/// Orientation an agent standing at `from` needs to face `toward`
/// (yaw only, zero pitch and roll).
pub fn facing_orientation(from: &Point3<f64>, toward: &Point3<f64>) -> UnitQuaternion<f64> {
    let yaw = (toward.y - from.y).atan2(toward.x - from.x);
    UnitQuaternion::from_euler_angles(0.0, 0.0, yaw)
}

/// The given orientation rotated 180 degrees about the vertical axis.
pub fn opposite_orientation(orientation: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    orientation * UnitQuaternion::from_euler_angles(0.0, 0.0, PI)
}
