//! Hierarchical transform editing.
//!
//! This crate moves node poses between representations without changing what
//! the scene looks like: freezing channels into a parent-offset matrix and
//! back, baking scale into descendants, and applying or copying world poses
//! while optionally keeping children in place.
//!
//! The operations are generic over [`SceneHost`], so they run against any
//! scene graph that implements the three capability traits in [`host`].
//! [`Scene`] is the in-memory implementation used by the command line tool
//! and the tests.

pub use xform_common as common;

mod error;
mod scene;

pub mod channels;
pub mod format;
pub mod freeze;
pub mod host;
pub mod node;
pub mod pose;
pub mod report;
pub mod scale_baker;
pub mod snapshot;
pub mod tree;


pub use channels::Space;
pub use error::TransformError;
pub use format::FormatError;
pub use freeze::{freeze, unfreeze, FreezeOptions};
pub use host::{ChannelAccess, GeometryAccess, GraphAccess, SceneHost};
pub use node::{Channel, Channels, Locator, Node, NodeId, NodeKind, Pivots};
pub use pose::{apply_transform_matrix, apply_world_matrix, copy_transform, ApplyOptions};
pub use report::{LogSink, Warning, WarningSink};
pub use scale_baker::freeze_scale;
pub use scene::Scene;
pub use snapshot::Snapshot;
pub use tree::{descendants, walk_tree, TreeVisitor};
