pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod id;
pub mod model;
pub mod selection;
pub mod store;

pub use config::CanvasConfig;
pub use error::{EntityKind, FlowError, FlowResult, ValidationError};
pub use graph::FlowGraph;
pub use history::{History, Snapshot};
pub use id::{EdgeId, GroupId, NodeId};
pub use model::*;
pub use selection::{Selection, SelectionKind};
pub use store::GraphStore;
