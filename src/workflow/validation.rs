use super::{Node, Workflow};

impl Workflow {
    /// Whether every node, including every node inside every branch, is configured.
    ///
    /// A workflow may be saved as a draft either way, but only a fully validated one
    /// can be activated.
    pub fn all_nodes_validated(&self) -> bool {
        self.first_unvalidated().is_none()
    }

    /// The first unconfigured node in depth-first order, if any.
    pub fn first_unvalidated(&self) -> Option<&Node> {
        self.search(&self.root, &mut |node| !node.validated)
    }
}
