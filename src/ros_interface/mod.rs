//! ROS 2 glue for the approach server.
//!
//! `r2r`-backed implementations of the external collaborator traits:
//! - transform tree access over `/tf` and `/tf_static`,
//! - route planning over the `nav_msgs/GetPlan` service,
//! - navigation over the `NavigateToPose` action,
//! - head pointing over the `PointHead` action,
//! - odometry tracking from the odometry topic.
//!
//! All ROS communication is driven by a single spin thread; the blocking
//! trait methods wait on `r2r` futures completed by that thread.

pub mod convert;

mod clients;
mod odometry;
mod tf;

pub use clients::{GetPlanPlanner, Nav2Client, PointHeadClient};
pub use odometry::spawn_odometry_listener;
pub use tf::TfBuffer;

use log::info;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::server::{FeedbackPublisher, MoveToHumanFeedback};
use crate::transform::MAP_FRAME;

/// Shared handle to the ROS node, spun by a background thread.
pub type SharedNode = Arc<Mutex<r2r::Node>>;

/// Spawn the thread that services ROS communication for the process
/// lifetime.
pub fn spawn_spin_thread(node: SharedNode) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || loop {
        if let Ok(mut node) = node.lock() {
            node.spin_once(Duration::from_millis(100));
        }
    })
}

/// Publishes navigation feedback as `PoseStamped` messages in the map
/// frame.
pub struct RosFeedbackPublisher {
    publisher: r2r::Publisher<r2r::geometry_msgs::msg::PoseStamped>,
}

impl RosFeedbackPublisher {
    /// Create a feedback publisher on the given topic.
    pub fn new(node: &mut r2r::Node, topic: &str) -> Result<Self, r2r::Error> {
        let publisher = node.create_publisher(topic, r2r::QosProfile::default())?;
        info!("Publishing feedback on {}", topic);
        Ok(RosFeedbackPublisher { publisher })
    }
}

impl FeedbackPublisher for RosFeedbackPublisher {
    fn publish(&mut self, feedback: MoveToHumanFeedback) {
        let msg = convert::pose_to_stamped(&feedback.robot_pose, MAP_FRAME);
        if let Err(e) = self.publisher.publish(&msg) {
            log::warn!("Failed to publish feedback: {}", e);
        }
    }
}
