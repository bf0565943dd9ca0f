//! # certflow - Certificate Workflow Definition Model
//!
//! **certflow** is the definition model behind a visual editor for certificate-lifecycle
//! pipelines (issue → deploy → notify). A workflow is a chain of typed nodes rooted at a
//! Start node; Branch nodes fork the chain into parallel branches that rejoin afterwards,
//! and each branch is usually guarded by a Condition node holding a small boolean
//! expression.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: Parse the persisted JSON document into a [`workflow::Workflow`] with
//!     `Workflow::from_json`, or start from `Workflow::blank()` / a [`workflow::Template`].
//! 2.  **Edit**: Every editor action is one call on the current workflow (`add_node`,
//!     `remove_branch`, ...). Each returns a new workflow and leaves the old one as it was;
//!     nodes that were not touched are shared between the two.
//! 3.  **Edit conditions**: Convert a Condition node's expression into flat editor rows with
//!     [`expr::expr_to_form_values`] and back with [`expr::form_values_to_expr`]. The
//!     variables a condition may reference come from `Workflow::variables_before`.
//! 4.  **Save**: Feed edits through a [`draft::DraftStore`], which keeps one save in flight
//!     and tracks the server revision. Activation requires `all_nodes_validated`.
//!
//! ## Quick Start
//!
//! ```rust
//! use certflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     // A blank workflow holds only the Start node.
//!     let workflow = Workflow::blank();
//!     let start = workflow.root_id().clone();
//!
//!     // Issue a certificate, then fork into two branches.
//!     let apply = Fragment::new(NodeType::Apply);
//!     let apply_id = apply.head().id.clone();
//!     let workflow = workflow.add_node(&start, apply)?;
//!
//!     let branch = Fragment::new(NodeType::Branch);
//!     let branch_id = branch.head().id.clone();
//!     let workflow = workflow.add_node(&apply_id, branch)?;
//!
//!     // Guard the first branch on the certificate's remaining days.
//!     let condition_id = workflow.find_node(&branch_id).unwrap().branches[0].clone();
//!     let variables = workflow.variables_before(&condition_id, Some(ValueType::Number))?;
//!     let days_left = &variables[0].selector;
//!
//!     let form = ConditionFormValues {
//!         conditions: vec![ConditionItem::new(days_left.key(), ComparisonOperator::Lt, "30")],
//!         logical_operator: LogicalOperator::And,
//!     };
//!     let mut condition = workflow.find_node(&condition_id).unwrap().clone();
//!     condition.set_expression(form_values_to_expr(&form));
//!     condition.validated = true;
//!     let workflow = workflow.update_node(condition)?;
//!
//!     println!("{}", workflow.display());
//!     println!("ready to activate: {}", workflow.all_nodes_validated());
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod draft;
pub mod error;
pub mod expr;
pub mod prelude;
pub mod workflow;
