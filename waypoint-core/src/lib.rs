//! # waypoint-core
//!
//! Foundation crate for the Waypoint movement-prediction engine.
//! Defines the domain types (movement and location records, derived
//! features, feature vectors, training datasets), the prediction and
//! recommendation output types, errors, configuration, the clock
//! abstraction, and the cooperative cancellation token.
//! Every other crate in the workspace depends on this.

pub mod cancel;
pub mod clock;
pub mod collections;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod features;
pub mod logging;
pub mod predictions;
pub mod recommendation;
pub mod records;
pub mod vector;

// Re-export the most commonly used types at the crate root.
pub use cancel::CancelToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use collections::{FxHashMap, FxHashSet};
pub use config::WaypointConfig;
pub use errors::{EngineError, FeatureError, ModelError, WaypointErrorCode};
pub use records::{LocationRecord, MovementRecord, MovementType};
pub use vector::FeatureVector;
