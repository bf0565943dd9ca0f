//! Common test utilities for building workflow documents with known ids.
use certflow::prelude::*;
use serde_json::json;

/// Shorthand for a node id.
#[allow(dead_code)]
pub fn id(raw: &str) -> NodeId {
    NodeId::from(raw)
}

/// Selector key for the `daysLeft` field of an Apply node's certificate.
#[allow(dead_code)]
pub fn days_left_key(node_id: &str) -> String {
    format!("{}#certificate.daysLeft#number", node_id)
}

/// Selector key for the `validity` field of an Apply node's certificate.
#[allow(dead_code)]
pub fn validity_key(node_id: &str) -> String {
    format!("{}#certificate.validity#boolean", node_id)
}

/// A fully configured workflow with one fork.
///
/// ```text
/// start -> apply -> branch -> notify -> end
///                   ├── cond_a -> deploy_a
///                   └── cond_b -> apply_b -> notify_b
/// ```
#[allow(dead_code)]
pub fn sample_document() -> serde_json::Value {
    json!({
        "id": "start", "type": "start", "name": "Start",
        "config": { "trigger": "manual" }, "validated": true,
        "next": {
            "id": "apply", "type": "apply", "name": "Apply",
            "config": { "domains": "example.com" }, "validated": true,
            "next": {
                "id": "branch", "type": "branch", "name": "Fork", "config": {}, "validated": true,
                "branches": [
                    {
                        "id": "cond_a", "type": "condition", "name": "Expiring",
                        "config": {
                            "expression": {
                                "type": "compare",
                                "operator": "lt",
                                "left": { "type": "var", "selector": { "id": "apply", "name": "certificate.daysLeft", "type": "number" } },
                                "right": { "type": "const", "value": "30", "valueType": "number" }
                            }
                        },
                        "validated": true,
                        "next": {
                            "id": "deploy_a", "type": "deploy", "name": "Deploy", "config": {}, "validated": true,
                            "next": null
                        }
                    },
                    {
                        "id": "cond_b", "type": "condition", "name": "Otherwise", "config": {}, "validated": true,
                        "next": {
                            "id": "apply_b", "type": "apply", "name": "Reissue", "config": {}, "validated": true,
                            "next": {
                                "id": "notify_b", "type": "notify", "name": "Notify B", "config": {}, "validated": true,
                                "next": null
                            }
                        }
                    }
                ],
                "next": {
                    "id": "notify", "type": "notify", "name": "Notify", "config": {}, "validated": true,
                    "next": {
                        "id": "end", "type": "end", "name": "End", "config": {}, "validated": true,
                        "next": null
                    }
                }
            }
        }
    })
}

#[allow(dead_code)]
pub fn sample_workflow() -> Workflow {
    Workflow::from_value(sample_document()).expect("sample document is valid")
}

/// A workflow with a fork nested inside a branch of another fork.
///
/// ```text
/// start -> outer -> end
///          ├── c1 -> inner
///          │         ├── c11 -> deploy_deep
///          │         └── c12
///          └── c2
/// ```
#[allow(dead_code)]
pub fn nested_document() -> serde_json::Value {
    json!({
        "id": "start", "type": "start", "name": "Start", "validated": true,
        "next": {
            "id": "outer", "type": "branch", "name": "Outer", "validated": true,
            "branches": [
                {
                    "id": "c1", "type": "condition", "name": "C1", "validated": true,
                    "next": {
                        "id": "inner", "type": "branch", "name": "Inner", "validated": true,
                        "branches": [
                            {
                                "id": "c11", "type": "condition", "name": "C11", "validated": true,
                                "next": { "id": "deploy_deep", "type": "deploy", "name": "Deep", "validated": true }
                            },
                            { "id": "c12", "type": "condition", "name": "C12", "validated": true }
                        ]
                    }
                },
                { "id": "c2", "type": "condition", "name": "C2", "validated": true }
            ],
            "next": { "id": "end", "type": "end", "name": "End", "validated": true }
        }
    })
}

#[allow(dead_code)]
pub fn nested_workflow() -> Workflow {
    Workflow::from_value(nested_document()).expect("nested document is valid")
}

/// Ids of the chain starting at `head`, in order.
#[allow(dead_code)]
pub fn chain_ids(workflow: &Workflow, head: &str) -> Vec<String> {
    let head = id(head);
    workflow
        .chain_from(&head)
        .map(|node| node.id.to_string())
        .collect()
}

/// Ids of the top-level chain, in order.
#[allow(dead_code)]
pub fn top_level_ids(workflow: &Workflow) -> Vec<String> {
    workflow
        .chain_elements()
        .map(|node| node.id.to_string())
        .collect()
}

/// Branch head ids of a Branch node.
#[allow(dead_code)]
pub fn branch_heads(workflow: &Workflow, branch: &str) -> Vec<String> {
    workflow
        .find_node(&id(branch))
        .expect("branch node exists")
        .branches
        .iter()
        .map(|head| head.to_string())
        .collect()
}
