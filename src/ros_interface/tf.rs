//! Minimal transform-tree buffer over `/tf` and `/tf_static`.
//!
//! Keeps the latest parent-to-child transform for every frame and resolves
//! a lookup by composing both frames' chains up to their common root. The
//! buffer is overwritten by listener threads as messages arrive; lookups
//! retry until the chain connects or the bounded wait elapses.

use nalgebra::Isometry3;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::StreamExt;

use super::convert;
use crate::transform::{Transform, TransformError, TransformProvider, TF_LOOKUP_TIMEOUT};

// child frame -> (parent frame, parent-from-child isometry)
type Edges = HashMap<String, (String, Isometry3<f64>)>;

const RETRY_INTERVAL: Duration = Duration::from_millis(50);
const MAX_CHAIN_DEPTH: usize = 64;

/// Transform provider fed by tf listener threads.
#[derive(Clone, Default)]
pub struct TfBuffer {
    edges: Arc<Mutex<Edges>>,
}

impl TfBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        TfBuffer::default()
    }

    /// Subscribe to `/tf` and `/tf_static` and spawn the listener threads
    /// feeding this buffer.
    pub fn listen(&self, node: &mut r2r::Node) -> Result<(), r2r::Error> {
        for topic in ["/tf", "/tf_static"] {
            let stream = node.subscribe::<r2r::tf2_msgs::msg::TFMessage>(
                topic,
                r2r::QosProfile::default(),
            )?;
            let edges = self.edges.clone();
            std::thread::spawn(move || {
                futures::executor::block_on(stream.for_each(move |msg| {
                    if let Ok(mut edges) = edges.lock() {
                        for stamped in &msg.transforms {
                            edges.insert(
                                stamped.child_frame_id.clone(),
                                (
                                    stamped.header.frame_id.clone(),
                                    convert::isometry_from_msg(&stamped.transform),
                                ),
                            );
                        }
                    }
                    futures::future::ready(())
                }));
            });
        }
        Ok(())
    }

    /// Compose the chain from `frame` up to its root; returns the root
    /// frame name and the root-from-frame isometry.
    fn chain_to_root(edges: &Edges, frame: &str) -> Option<(String, Isometry3<f64>)> {
        let mut iso = Isometry3::identity();
        let mut current = frame.to_string();
        for _ in 0..MAX_CHAIN_DEPTH {
            match edges.get(&current) {
                Some((parent, step)) => {
                    iso = step * iso;
                    current = parent.clone();
                }
                None => return Some((current, iso)),
            }
        }
        // Cycle in the tf tree.
        None
    }

    fn try_lookup(&self, frame: &str, reference: &str) -> Option<Transform> {
        let edges = self.edges.lock().ok()?;
        let (frame_root, root_from_frame) = Self::chain_to_root(&edges, frame)?;
        let (reference_root, root_from_reference) = Self::chain_to_root(&edges, reference)?;
        if frame_root != reference_root {
            return None;
        }
        let reference_from_frame = root_from_reference.inverse() * root_from_frame;
        Some(convert::transform_from_isometry(&reference_from_frame))
    }
}

impl TransformProvider for TfBuffer {
    fn lookup(&self, frame: &str, reference: &str) -> Result<Transform, TransformError> {
        let deadline = Instant::now() + TF_LOOKUP_TIMEOUT;
        loop {
            if let Some(transform) = self.try_lookup(frame, reference) {
                return Ok(transform);
            }
            if Instant::now() >= deadline {
                log::error!("Failed to lookup transform of '{}' in '{}'.", frame, reference);
                return Err(TransformError::Unavailable {
                    frame: frame.to_string(),
                    reference: reference.to_string(),
                });
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
    }
}
