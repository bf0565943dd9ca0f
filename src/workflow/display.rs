use super::{Node, NodeId, NodeType, Workflow};
use std::fmt;

/// Renders a workflow as an indented tree, one node per line, with branches drawn
/// beneath their Branch node.
pub struct DisplayWorkflow<'a> {
    pub workflow: &'a Workflow,
    /// Append node ids to each line.
    pub show_ids: bool,
}

impl Workflow {
    pub fn display(&self) -> DisplayWorkflow<'_> {
        DisplayWorkflow {
            workflow: self,
            show_ids: false,
        }
    }
}

impl<'a> DisplayWorkflow<'a> {
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }

    fn fmt_chain(&self, f: &mut fmt::Formatter<'_>, head: &NodeId, prefix: &str) -> fmt::Result {
        for node in self.workflow.chain_from(head) {
            writeln!(f, "{}{}", prefix, self.label(node))?;

            let count = node.branches.len();
            for (index, branch) in node.branches.iter().enumerate() {
                let is_last = index + 1 == count;
                let marker = if is_last { "└── " } else { "├── " };
                let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
                writeln!(f, "{}{}branch {}", prefix, marker, index + 1)?;
                self.fmt_chain(f, branch, &child_prefix)?;
            }
        }
        Ok(())
    }

    fn label(&self, node: &Node) -> String {
        let mut label = format!("{} [{}]", node.name, node.node_type);
        if node.node_type == NodeType::Condition {
            match node.expression() {
                Ok(Some(expr)) => label.push_str(&format!(" if {}", expr)),
                Ok(None) => label.push_str(" (no condition)"),
                Err(_) => label.push_str(" (unreadable expression)"),
            }
        }
        if !node.validated {
            label.push_str(" *unconfigured*");
        }
        if self.show_ids {
            label.push_str(&format!(" #{}", node.id));
        }
        label
    }
}

impl<'a> fmt::Display for DisplayWorkflow<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_chain(f, self.workflow.root_id(), "")
    }
}
