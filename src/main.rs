//! Entry point for the "move to human" action server node.
//!
//! Wires the behavior server to its ROS 2 collaborators: the transform
//! tree, the plan service, the navigation and head actions and the
//! odometry feed. Requests arrive as YAML payloads on the request topic
//! and are handled one at a time; results are published the same way.

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use log::{error, info, warn};

use human_approach::ros_interface::{
    spawn_odometry_listener, spawn_spin_thread, GetPlanPlanner, Nav2Client, PointHeadClient,
    RosFeedbackPublisher, TfBuffer,
};
use human_approach::{
    ApproachConfig, HeadController, MoveToHumanRequest, MoveToHumanServer, OdometryTracker,
};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ApproachConfig::from_yaml_file(&path)?,
        None => {
            warn!("No config file given, using built-in defaults.");
            ApproachConfig::default()
        }
    };

    info!("Starting {} node...", config.ros.node_name);
    let ctx = r2r::Context::create()?;
    let mut node = r2r::Node::create(ctx, &config.ros.node_name, "")?;

    // Inbound requests and outbound results, YAML-encoded. The behavior's
    // action interface is exposed over plain topics so the server does not
    // depend on a custom interface package.
    let mut requests = node.subscribe::<r2r::std_msgs::msg::String>(
        &config.ros.request_topic,
        r2r::QosProfile::default(),
    )?;
    let result_publisher = node.create_publisher::<r2r::std_msgs::msg::String>(
        &config.ros.result_topic,
        r2r::QosProfile::default(),
    )?;
    let mut feedback = RosFeedbackPublisher::new(&mut node, &config.ros.feedback_topic)?;

    // External collaborators.
    let tf_buffer = TfBuffer::new();
    tf_buffer.listen(&mut node)?;
    let odometry = OdometryTracker::new();
    spawn_odometry_listener(&mut node, &config.ros.odometry_topic, odometry.clone())?;
    let planner = GetPlanPlanner::new(&mut node, &config.ros.plan_service)?;
    let navigation = Nav2Client::new(&mut node, &config.ros.navigate_action)?;
    let head = HeadController::new(
        PointHeadClient::new(
            &mut node,
            &config.ros.point_head_action,
            &config.behavior.robot_base_frame,
            &config.head.pointing_frame,
            config.head.rotation_velocity,
        )?,
        Duration::from_secs_f64(config.head.idle_timeout_s),
        Duration::from_secs_f64(config.head.poll_interval_s),
    );

    let node = Arc::new(Mutex::new(node));
    spawn_spin_thread(node);

    let mut server = MoveToHumanServer::new(
        tf_buffer,
        planner,
        navigation,
        head,
        odometry,
        &config,
    );
    server.complete_initialization();
    info!("Listening for requests on {}", config.ros.request_topic);

    // One request in flight at a time, by construction.
    while let Some(msg) = futures::executor::block_on(requests.next()) {
        let request: MoveToHumanRequest = match serde_yaml::from_str(&msg.data) {
            Ok(request) => request,
            Err(e) => {
                error!("Ignoring malformed request '{}': {}", msg.data, e);
                continue;
            }
        };
        let result = server.execute(&request, &mut feedback);
        match serde_yaml::to_string(&result) {
            Ok(data) => {
                if let Err(e) = result_publisher.publish(&r2r::std_msgs::msg::String { data }) {
                    error!("Failed to publish result: {}", e);
                }
            }
            Err(e) => error!("Failed to encode result: {}", e),
        }
    }

    Ok(())
}
