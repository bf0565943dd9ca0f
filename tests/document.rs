//! Tests for loading and storing the nested workflow document.
mod common;
use certflow::prelude::*;
use common::*;
use serde_json::json;

#[test]
fn test_load_sample() {
    let workflow = sample_workflow();
    assert_eq!(workflow.len(), 10);
    assert_eq!(workflow.root_id(), &id("start"));
    assert_eq!(branch_heads(&workflow, "branch"), vec!["cond_a", "cond_b"]);
    assert_eq!(
        workflow.find_node(&id("apply")).unwrap().config.get("domains"),
        Some(&json!("example.com"))
    );
}

#[test]
fn test_document_round_trip() {
    let workflow = sample_workflow();
    let stored = serde_json::to_value(workflow.to_document()).unwrap();
    assert_eq!(stored, sample_document());

    let reloaded = Workflow::from_json(&workflow.to_json().unwrap()).unwrap();
    assert_eq!(reloaded, workflow);
}

#[test]
fn test_missing_fields_take_defaults() {
    let workflow = nested_workflow();
    let c2 = workflow.find_node(&id("c2")).unwrap();
    assert!(c2.config.is_empty());
    assert_eq!(c2.next, None);
    assert_eq!(c2.expression().unwrap(), None);

    let reloaded = Workflow::from_json(&workflow.to_json_pretty().unwrap()).unwrap();
    assert_eq!(reloaded, workflow);
}

#[test]
fn test_round_trip_after_edits() {
    let workflow = sample_workflow()
        .duplicate_branch(&id("branch"), 0)
        .unwrap()
        .add_node(&id("notify"), Fragment::new(NodeType::Branch))
        .unwrap();
    let reloaded = Workflow::from_value(serde_json::to_value(workflow.to_document()).unwrap())
        .unwrap();
    assert_eq!(reloaded, workflow);
}

#[test]
fn test_root_must_be_start() {
    let result = Workflow::from_value(json!({ "id": "a", "type": "apply", "name": "Apply" }));
    assert!(matches!(result, Err(DocumentError::InvalidRoot(t)) if t == "apply"));
}

#[test]
fn test_second_start_is_rejected() {
    let result = Workflow::from_value(json!({
        "id": "s1", "type": "start",
        "next": { "id": "s2", "type": "start" }
    }));
    assert!(matches!(result, Err(DocumentError::InvalidNode { .. })));
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let in_chain = json!({
        "id": "start", "type": "start",
        "next": { "id": "x", "type": "notify", "next": { "id": "x", "type": "end" } }
    });
    assert!(matches!(
        Workflow::from_value(in_chain),
        Err(DocumentError::DuplicateNode(dup)) if dup == id("x")
    ));

    let across_branches = json!({
        "id": "start", "type": "start",
        "next": {
            "id": "b", "type": "branch",
            "branches": [
                { "id": "c", "type": "condition" },
                { "id": "c", "type": "condition" }
            ]
        }
    });
    assert!(matches!(
        Workflow::from_value(across_branches),
        Err(DocumentError::DuplicateNode(_))
    ));
}

#[test]
fn test_branch_shape_is_enforced() {
    let lonely_branch = json!({
        "id": "start", "type": "start",
        "next": {
            "id": "b", "type": "branch",
            "branches": [ { "id": "c", "type": "condition" } ]
        }
    });
    assert!(matches!(
        Workflow::from_value(lonely_branch),
        Err(DocumentError::InvalidNode { node_id, .. }) if node_id == id("b")
    ));

    let forking_notify = json!({
        "id": "start", "type": "start",
        "next": {
            "id": "n", "type": "notify",
            "branches": [
                { "id": "c1", "type": "condition" },
                { "id": "c2", "type": "condition" }
            ]
        }
    });
    assert!(matches!(
        Workflow::from_value(forking_notify),
        Err(DocumentError::InvalidNode { node_id, .. }) if node_id == id("n")
    ));
}

#[test]
fn test_unreadable_condition_is_rejected() {
    let document = json!({
        "id": "start", "type": "start",
        "next": {
            "id": "b", "type": "branch",
            "branches": [
                { "id": "c1", "type": "condition", "config": { "expression": { "type": "mystery" } } },
                { "id": "c2", "type": "condition" }
            ]
        }
    });
    assert!(matches!(
        Workflow::from_value(document),
        Err(DocumentError::InvalidNode { node_id, .. }) if node_id == id("c1")
    ));
}

#[test]
fn test_bad_json() {
    assert!(matches!(
        Workflow::from_json("{ not json"),
        Err(DocumentError::JsonParseError(_))
    ));
    assert!(matches!(
        Workflow::from_value(json!({ "id": "s", "type": "gateway" })),
        Err(DocumentError::JsonParseError(_))
    ));
}

/// A Start node followed by `count` Notify nodes, built one edit at a time.
fn long_chain(count: usize) -> std::result::Result<Workflow, GraphError> {
    let mut workflow = Workflow::blank();
    let mut tail = workflow.root_id().clone();
    for _ in 0..count {
        let fragment = Fragment::new(NodeType::Notify);
        let head = fragment.head().id.clone();
        workflow = workflow.add_node(&tail, fragment)?;
        tail = head;
    }
    Ok(workflow)
}

#[test]
fn test_long_chain_reloads() {
    let workflow = long_chain(200).unwrap();
    assert_eq!(workflow.len(), 201);
    assert_eq!(workflow.document_depth(), 202);

    let reloaded = Workflow::from_json(&workflow.to_json().unwrap()).unwrap();
    assert_eq!(reloaded, workflow);
    assert_eq!(top_level_ids(&reloaded).len(), 201);
}

#[test]
fn test_oversized_document_is_refused_before_parsing() {
    let json = format!("{}{}", "[".repeat(MAX_DOCUMENT_DEPTH + 1), "]".repeat(MAX_DOCUMENT_DEPTH + 1));
    assert!(matches!(
        Workflow::from_json(&json),
        Err(DocumentError::TooDeep { depth, limit })
            if depth == MAX_DOCUMENT_DEPTH + 1 && limit == MAX_DOCUMENT_DEPTH
    ));
}

#[test]
fn test_brackets_inside_strings_do_not_count() {
    let mut document = sample_document();
    document["name"] = json!("[".repeat(MAX_DOCUMENT_DEPTH * 2));
    let json = serde_json::to_string(&document).unwrap();
    assert_eq!(Workflow::from_json(&json).unwrap().root().name.len(), MAX_DOCUMENT_DEPTH * 2);
}
