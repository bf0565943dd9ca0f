mod common;
use certflow::prelude::*;
use common::*;

fn set_validated(workflow: &Workflow, node: &str, validated: bool) -> Workflow {
    let edited = workflow
        .find_node(&id(node))
        .unwrap()
        .clone()
        .with_validated(validated);
    workflow.update_node(edited).unwrap()
}

#[test]
fn test_fully_configured_workflow_validates() {
    assert!(sample_workflow().all_nodes_validated());
    assert!(nested_workflow().all_nodes_validated());
    assert!(sample_workflow().first_unvalidated().is_none());
}

#[test]
fn test_unvalidated_condition_two_branches_deep() {
    let workflow = set_validated(&nested_workflow(), "c12", false);
    assert!(!workflow.all_nodes_validated());
    assert_eq!(workflow.first_unvalidated().unwrap().id, id("c12"));

    let fixed = set_validated(&workflow, "c12", true);
    assert!(fixed.all_nodes_validated());
}

#[test]
fn test_first_unvalidated_is_depth_first() {
    let workflow = set_validated(&sample_workflow(), "notify", false);
    let workflow = set_validated(&workflow, "apply_b", false);
    // Branch contents come before the fork's successor.
    assert_eq!(workflow.first_unvalidated().unwrap().id, id("apply_b"));
}

#[test]
fn test_new_nodes_start_unconfigured() {
    let workflow = sample_workflow();
    let workflow = workflow
        .add_node(&id("notify"), Fragment::new(NodeType::Deploy))
        .unwrap();
    assert!(!workflow.all_nodes_validated());

    let workflow = sample_workflow().add_branch(&id("branch")).unwrap();
    let unconfigured = workflow.first_unvalidated().unwrap();
    assert_eq!(unconfigured.node_type, NodeType::Condition);
}

#[test]
fn test_removing_the_unconfigured_node_restores_validity() {
    let workflow = set_validated(&sample_workflow(), "deploy_a", false);
    assert!(!workflow.all_nodes_validated());
    let workflow = workflow.remove_branch(&id("branch"), 0).unwrap();
    assert!(workflow.all_nodes_validated());
}
