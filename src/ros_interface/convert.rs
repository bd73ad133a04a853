//! Conversions between `r2r` messages and the crate's geometry types.

use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};

use crate::geometry::{Pose, Route};

/// Convert a `geometry_msgs/Point` into a position.
pub fn point_from_msg(msg: &r2r::geometry_msgs::msg::Point) -> Point3<f64> {
    Point3::new(msg.x, msg.y, msg.z)
}

/// Convert a position into a `geometry_msgs/Point`.
pub fn point_to_msg(point: &Point3<f64>) -> r2r::geometry_msgs::msg::Point {
    r2r::geometry_msgs::msg::Point {
        x: point.x,
        y: point.y,
        z: point.z,
    }
}

/// Convert a `geometry_msgs/Quaternion` into a unit quaternion.
pub fn quaternion_from_msg(msg: &r2r::geometry_msgs::msg::Quaternion) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(msg.w, msg.x, msg.y, msg.z))
}

/// Convert a unit quaternion into a `geometry_msgs/Quaternion`.
pub fn quaternion_to_msg(q: &UnitQuaternion<f64>) -> r2r::geometry_msgs::msg::Quaternion {
    let q = q.quaternion();
    r2r::geometry_msgs::msg::Quaternion {
        x: q.i,
        y: q.j,
        z: q.k,
        w: q.w,
    }
}

/// Convert a `geometry_msgs/Pose` into a pose.
pub fn pose_from_msg(msg: &r2r::geometry_msgs::msg::Pose) -> Pose {
    Pose::new(
        point_from_msg(&msg.position),
        quaternion_from_msg(&msg.orientation),
    )
}

/// Convert a pose into a `geometry_msgs/Pose`.
pub fn pose_to_msg(pose: &Pose) -> r2r::geometry_msgs::msg::Pose {
    r2r::geometry_msgs::msg::Pose {
        position: point_to_msg(&pose.position),
        orientation: quaternion_to_msg(&pose.orientation),
    }
}

/// Wrap a pose into a `geometry_msgs/PoseStamped` in the given frame.
pub fn pose_to_stamped(pose: &Pose, frame: &str) -> r2r::geometry_msgs::msg::PoseStamped {
    r2r::geometry_msgs::msg::PoseStamped {
        header: r2r::std_msgs::msg::Header {
            frame_id: frame.to_string(),
            ..Default::default()
        },
        pose: pose_to_msg(pose),
    }
}

/// Convert a `geometry_msgs/Transform` into an isometry.
pub fn isometry_from_msg(msg: &r2r::geometry_msgs::msg::Transform) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::new(msg.translation.x, msg.translation.y, msg.translation.z),
        quaternion_from_msg(&msg.rotation),
    )
}

/// Convert a `nav_msgs/Path` into a route.
pub fn route_from_path(path: &r2r::nav_msgs::msg::Path) -> Route {
    Route::new(
        path.poses
            .iter()
            .map(|stamped| pose_from_msg(&stamped.pose))
            .collect(),
    )
}

/// Split an isometry into the crate's transform representation.
pub fn transform_from_isometry(iso: &Isometry3<f64>) -> crate::transform::Transform {
    crate::transform::Transform {
        translation: Vector3::new(
            iso.translation.vector.x,
            iso.translation.vector.y,
            iso.translation.vector.z,
        ),
        rotation: iso.rotation,
    }
}
