//! Odometry listener feeding the orchestrator's pose snapshot.

use futures::StreamExt;
use log::info;

use super::convert;
use crate::server::OdometryTracker;

/// Subscribe to the odometry topic and spawn the listener thread that
/// overwrites the tracker with each incoming pose (last write wins).
pub fn spawn_odometry_listener(
    node: &mut r2r::Node,
    topic: &str,
    tracker: OdometryTracker,
) -> Result<std::thread::JoinHandle<()>, r2r::Error> {
    let stream =
        node.subscribe::<r2r::nav_msgs::msg::Odometry>(topic, r2r::QosProfile::default())?;
    info!("Listening for odometry on {}", topic);
    Ok(std::thread::spawn(move || {
        futures::executor::block_on(stream.for_each(move |msg| {
            tracker.update(convert::pose_from_msg(&msg.pose.pose));
            futures::future::ready(())
        }));
    }))
}
