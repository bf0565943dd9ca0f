//! The workflow graph: nodes, the arena that holds them, and every operation the
//! editor performs on it.

mod display;
mod graph;
mod mutation;
mod node;
mod outputs;
mod template;
mod validation;

pub use display::DisplayWorkflow;
pub use graph::{Chain, Slot, Workflow};
pub use node::{EXPRESSION_KEY, Node, NodeConfig, NodeId, NodeType};
pub use outputs::{NodeOutputs, OutputDefinition, OutputType, Variable};
pub use template::{Fragment, Template};

pub(crate) use template::check_branch_shape;
