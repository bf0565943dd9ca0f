//! Property tests: random edits keep the graph invariants, and the condition form codec
//! settles after one encode.
mod common;
use certflow::prelude::*;
use common::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn arb_insertable_type() -> impl Strategy<Value = NodeType> {
    prop_oneof![
        Just(NodeType::Apply),
        Just(NodeType::Deploy),
        Just(NodeType::Notify),
        Just(NodeType::Branch),
        Just(NodeType::Condition),
        Just(NodeType::End),
    ]
}

fn arb_operator() -> impl Strategy<Value = ComparisonOperator> {
    prop_oneof![
        Just(ComparisonOperator::Eq),
        Just(ComparisonOperator::Neq),
        Just(ComparisonOperator::Gt),
        Just(ComparisonOperator::Gte),
        Just(ComparisonOperator::Lt),
        Just(ComparisonOperator::Lte),
    ]
}

fn arb_selector_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(days_left_key("apply")),
        Just(validity_key("apply")),
        Just("apply#domain#string".to_string()),
        Just("n7#certificate.daysLeft#NUMBER".to_string()),
    ]
}

/// A row that may be missing any of its parts.
fn arb_row() -> impl Strategy<Value = ConditionItem> {
    (
        proptest::option::weighted(0.8, arb_selector_key()),
        proptest::option::weighted(0.8, arb_operator()),
        proptest::option::weighted(0.8, "[a-z0-9]{0,6}"),
    )
        .prop_map(|(left_selector, operator, right_value)| ConditionItem {
            left_selector,
            operator,
            right_value,
        })
}

fn arb_form() -> impl Strategy<Value = ConditionFormValues> {
    (
        proptest::collection::vec(arb_row(), 0..6),
        prop_oneof![Just(LogicalOperator::And), Just(LogicalOperator::Or)],
    )
        .prop_map(|(conditions, logical_operator)| ConditionFormValues {
            conditions,
            logical_operator,
        })
}

#[derive(Debug, Clone)]
enum Edit {
    Add(usize, NodeType),
    Remove(usize),
    Duplicate(usize),
    AddBranch(usize),
    DuplicateBranch(usize, usize),
    RemoveBranch(usize, usize),
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), arb_insertable_type()).prop_map(|(i, t)| Edit::Add(i, t)),
        any::<usize>().prop_map(Edit::Remove),
        any::<usize>().prop_map(Edit::Duplicate),
        any::<usize>().prop_map(Edit::AddBranch),
        (any::<usize>(), 0usize..4).prop_map(|(i, b)| Edit::DuplicateBranch(i, b)),
        (any::<usize>(), 0usize..4).prop_map(|(i, b)| Edit::RemoveBranch(i, b)),
    ]
}

/// Applies an edit to the node at `pick` in walk order. Rejected edits keep the input.
fn apply_edit(workflow: &Workflow, edit: &Edit) -> Workflow {
    let nodes = workflow.walk();
    let pick = |i: usize| nodes[i % nodes.len()].id.clone();
    let result = match edit {
        Edit::Add(i, t) => workflow.add_node(&pick(*i), Fragment::new(*t)),
        Edit::Remove(i) => workflow.remove_node(&pick(*i)),
        Edit::Duplicate(i) => workflow.duplicate_node(&pick(*i)),
        Edit::AddBranch(i) => workflow.add_branch(&pick(*i)),
        Edit::DuplicateBranch(i, b) => workflow.duplicate_branch(&pick(*i), *b),
        Edit::RemoveBranch(i, b) => workflow.remove_branch(&pick(*i), *b),
    };
    result.unwrap_or_else(|_| workflow.clone())
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Adding a node and removing it again gives back the original workflow.
    #[test]
    fn add_then_remove_is_identity(pick in any::<usize>(), node_type in arb_insertable_type()) {
        let workflow = sample_workflow();
        let nodes = workflow.walk();
        let target = nodes[pick % nodes.len()].id.clone();

        let fragment = Fragment::new(node_type);
        let head = fragment.head().id.clone();
        let added = workflow.add_node(&target, fragment).unwrap();
        let removed = added.remove_node(&head).unwrap();

        prop_assert_eq!(removed, workflow);
    }

    /// Any sequence of edits leaves a workflow that survives a document round trip,
    /// which re-checks every structural invariant.
    #[test]
    fn edits_preserve_invariants(edits in proptest::collection::vec(arb_edit(), 1..25)) {
        let mut workflow = sample_workflow();
        for edit in &edits {
            workflow = apply_edit(&workflow, edit);

            prop_assert_eq!(workflow.root().node_type, NodeType::Start);
            prop_assert_eq!(workflow.walk().len(), workflow.len());
            for node in workflow.walk() {
                if node.is_branch() {
                    prop_assert!(node.branches.len() >= 2);
                } else {
                    prop_assert!(node.branches.is_empty());
                }
            }
        }

        let reloaded = Workflow::from_value(serde_json::to_value(workflow.to_document()).unwrap());
        prop_assert_eq!(reloaded.unwrap(), workflow);
    }

    /// Encoding a form, decoding it and encoding again reproduces the same expression.
    #[test]
    fn form_codec_reaches_fixpoint(form in arb_form()) {
        let first = form_values_to_expr(&form);
        let rows = expr_to_form_values(first.as_ref()).unwrap();
        let second = form_values_to_expr(&rows);
        prop_assert_eq!(&second, &first);

        if let Some(expr) = first {
            prop_assert!(expr.check_well_formed().is_ok());
            let complete = form
                .conditions
                .iter()
                .filter(|row| {
                    row.left_selector.is_some()
                        && row.operator.is_some()
                        && row.right_value.as_deref().is_some_and(|value| !value.is_empty())
                })
                .count();
            prop_assert_eq!(rows.conditions.len(), complete);
        }
    }
}
