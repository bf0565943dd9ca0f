use crate::expr::{ComparisonOperator, Value};
use crate::workflow::NodeId;
use thiserror::Error;

/// Errors raised by the graph mutation engine and the output resolver.
///
/// Every one of these leaves the input workflow untouched; callers re-render the
/// existing state and skip persisting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{0}' not found in the workflow")]
    NodeNotFound(NodeId),

    #[error("Node '{0}' already exists in the workflow")]
    DuplicateNode(NodeId),

    #[error("Invalid branch state at node '{node_id}': {message}")]
    InvalidBranchState { node_id: NodeId, message: String },

    #[error("Branch index {index} is out of range for node '{node_id}' with {len} branches")]
    BranchIndexOutOfRange {
        node_id: NodeId,
        index: usize,
        len: usize,
    },

    #[error("Edit at node '{node_id}' would nest the workflow document {depth} levels deep (limit {limit})")]
    TooDeep {
        node_id: NodeId,
        depth: usize,
        limit: usize,
    },
}

/// Errors raised while decoding condition expressions and selector keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Invalid selector key '{key}': {message}")]
    InvalidSelectorKey { key: String, message: String },

    #[error("Failed to decode expression: {0}")]
    Decode(String),
}

/// Errors that can occur while evaluating a condition expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Variable '{0}' not found in the provided context")]
    VariableNotFound(String),

    #[error(
        "Type mismatch during operation '{operation}': expected {expected}, but found value '{found}'"
    )]
    TypeMismatch {
        operation: String,
        expected: String,
        found: Value,
    },

    #[error("Operator '{operator}' is not defined for {value_type} operands")]
    UnsupportedOperator {
        operator: ComparisonOperator,
        value_type: String,
    },

    #[error("Constant '{value}' cannot be read as {value_type}")]
    InvalidConstant { value: String, value_type: String },

    #[error(transparent)]
    Malformed(#[from] ExprError),
}

/// Errors that can occur when loading a persisted workflow document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to parse workflow JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Workflow root must be a start node, found '{0}'")]
    InvalidRoot(String),

    #[error("Node id '{0}' appears more than once in the document")]
    DuplicateNode(NodeId),

    #[error("Node '{node_id}' is invalid: {message}")]
    InvalidNode { node_id: NodeId, message: String },

    #[error("Workflow document is nested {depth} levels deep (limit {limit})")]
    TooDeep { depth: usize, limit: usize },
}

/// Errors raised by the draft store while sequencing saves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("A save is already in flight for this workflow")]
    SaveInFlight,

    #[error("No save is in flight")]
    NoSaveInFlight,

    #[error("Stale revision: expected a revision newer than {base}, but the server returned {found}")]
    StaleRevision { base: u64, found: u64 },

    #[error("Workflow cannot be activated: node '{node_id}' is not configured")]
    NotValidated { node_id: NodeId },
}
