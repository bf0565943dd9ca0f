//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the certflow crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use certflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/workflow.json")?;
//! let workflow = Workflow::from_json(&json)?;
//!
//! if let Some(node) = workflow.first_unvalidated() {
//!     println!("'{}' still needs configuration", node.name);
//! }
//! # Ok(())
//! # }
//! ```

// Graph model and editing
pub use crate::workflow::{
    Fragment, Node, NodeConfig, NodeId, NodeOutputs, NodeType, Slot, Template, Variable,
    Workflow,
};

// Expressions
pub use crate::expr::{
    ComparisonOperator, ConditionFormValues, ConditionItem, Expr, LogicalOperator, Selector,
    Value, ValueType, Variables, expr_to_form_values, form_values_to_expr,
};

// Persistence
pub use crate::document::{MAX_DOCUMENT_DEPTH, NodeDocument};
pub use crate::draft::{DraftStore, SaveOutcome, SaveRequest, SaveResolution};

// Error types
pub use crate::error::{DocumentError, DraftError, EvaluationError, ExprError, GraphError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
