//! Human approach behavior for a mobile service robot.
//!
//! This crate implements a "move to human" action server: on request it
//! selects a standing position a configured distance away from a detected
//! human, drives the robot there through the external navigation stack and
//! finally points the robot's head at the human. The navigation stack, the
//! route planner, the transform tree and the head actuator are consumed
//! through traits so the behavior itself stays free of ROS dependencies;
//! the optional `ros` feature provides `r2r`-backed implementations.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod geometry;
pub mod head;
pub mod selection;
pub mod server;
pub mod transform;

#[cfg(feature = "ros")]
pub mod ros_interface;

// Re-export commonly used items for easier access
pub use geometry::{Pose, Route};
pub use head::{HeadActuator, HeadController, HeadError};
pub use selection::{DestinationSelector, PlanError, RoutePlanner, SelectionError};
pub use server::{
    FeedbackPublisher, MoveToHumanFeedback, MoveToHumanRequest, MoveToHumanResult,
    MoveToHumanServer, NavigationClient, OdometryTracker, Status,
};
pub use transform::{Transform, TransformError, TransformProvider};

/// Main configuration structure for the approach server.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApproachConfig {
    /// ROS names (node, topics, services, actions)
    pub ros: RosConfig,
    /// Approach behavior parameters
    pub behavior: BehaviorConfig,
    /// Head actuation parameters
    pub head: HeadConfig,
}

/// ROS-facing names, fixed for the process lifetime.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RosConfig {
    /// Node name
    pub node_name: String,
    /// Topic on which approach requests arrive
    pub request_topic: String,
    /// Topic on which navigation feedback is streamed
    pub feedback_topic: String,
    /// Topic on which the terminal result is published
    pub result_topic: String,
    /// Robot odometry topic
    pub odometry_topic: String,
    /// Name of the navigation plan service
    pub plan_service: String,
    /// Name of the navigation action
    pub navigate_action: String,
    /// Name of the head pointing action
    pub point_head_action: String,
}

/// Parameters of the approach behavior itself.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BehaviorConfig {
    /// Default tf frame of the detected human
    pub human_frame: String,
    /// Tf frame of the robot base
    pub robot_base_frame: String,
    /// Default standing distance from the human (meters)
    pub default_distance_from_human: f64,
    /// Number of candidate standing positions generated around the human
    pub candidate_count: usize,
    /// Upper bound on a single navigation run (seconds)
    pub navigation_timeout_s: f64,
}

/// Parameters of the head controller.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HeadConfig {
    /// Tf frame of the pointing axis
    pub pointing_frame: String,
    /// Maximum head rotation velocity (rad/s)
    pub rotation_velocity: f64,
    /// Upper bound on waiting for the head to become idle (seconds)
    pub idle_timeout_s: f64,
    /// Interval between head idle polls (seconds)
    pub poll_interval_s: f64,
}

impl Default for ApproachConfig {
    fn default() -> Self {
        ApproachConfig {
            ros: RosConfig {
                node_name: "move_to_human_server".to_string(),
                request_topic: "/move_to_human/request".to_string(),
                feedback_topic: "/move_to_human/feedback".to_string(),
                result_topic: "/move_to_human/result".to_string(),
                odometry_topic: "/mobile_base_controller/odom".to_string(),
                plan_service: "/move_base/make_plan".to_string(),
                navigate_action: "/navigate_to_pose".to_string(),
                point_head_action: "/head_controller/point_head_action".to_string(),
            },
            behavior: BehaviorConfig {
                human_frame: "human".to_string(),
                robot_base_frame: "base_link".to_string(),
                default_distance_from_human: 1.5,
                candidate_count: selection::DEFAULT_CANDIDATE_COUNT,
                navigation_timeout_s: 120.0,
            },
            head: HeadConfig {
                pointing_frame: "head_2_link".to_string(),
                rotation_velocity: 0.5,
                idle_timeout_s: 10.0,
                poll_interval_s: 0.05,
            },
        }
    }
}

impl ApproachConfig {
    /// Load the configuration from a YAML file.
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_string(), e))?;
        serde_yaml::from_str(&contents).map_err(ConfigError::Parse)
    }
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    Io(String, std::io::Error),
    /// The configuration file could not be parsed
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "failed to read config '{}': {}", path, e),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
