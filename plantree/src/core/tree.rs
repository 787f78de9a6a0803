//! Arena-backed plan tree and its presentation state.
//!
//! Nodes live in a single `Vec` owned by [`Tree`]; parents hold ordered
//! child ids and children keep their parent id for upward navigation only.
//! The root (id 0) is synthetic and never rendered.

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Line,
    /// Synthetic node standing in for a pending confirmation prompt.
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Line text with colors already translated to markup.
    pub text: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub expanded: bool,
    pub selectable: bool,
}

/// A visible row: the node and its depth below the hidden root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub id: NodeId,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<Node>,
}

pub const ROOT_TEXT: &str = "Terraform plan";

impl Default for Tree {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                text: ROOT_TEXT.to_string(),
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
                expanded: true,
                selectable: false,
            }],
        }
    }
}

impl Tree {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the synthetic root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Parent of `id`, or `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Append a non-selectable line as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, text: String) -> NodeId {
        self.push_node(parent, text, NodeKind::Line, false)
    }

    /// Append the selectable confirmation node under the root.
    pub fn append_confirm(&mut self, prompt: &str) -> NodeId {
        let root = self.root();
        self.push_node(root, prompt.to_string(), NodeKind::Confirm, true)
    }

    fn push_node(
        &mut self,
        parent: NodeId,
        text: String,
        kind: NodeKind,
        selectable: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            text,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            expanded: true,
            selectable,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn set_selectable(&mut self, id: NodeId, selectable: bool) {
        self.nodes[id.0].selectable = selectable;
    }

    /// Set the expansion flag and rewrite the bracket suffix to match.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        let node = &mut self.nodes[id.0];
        node.expanded = expanded;
        node.text = if expanded {
            expanded_text(&node.text)
        } else {
            collapsed_text(&node.text)
        };
    }

    pub fn toggle(&mut self, id: NodeId) {
        let expanded = self.node(id).expanded;
        self.set_expanded(id, !expanded);
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.node(id).children.is_empty()
    }

    /// Rows shown on screen, in pre-order, skipping collapsed subtrees.
    pub fn visible_rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for &child in self.children(self.root()) {
            self.collect_visible(child, 0, &mut rows);
        }
        rows
    }

    fn collect_visible(&self, id: NodeId, depth: usize, rows: &mut Vec<Row>) {
        rows.push(Row { id, depth });
        let node = self.node(id);
        if node.expanded {
            for &child in &node.children {
                self.collect_visible(child, depth + 1, rows);
            }
        }
    }

    /// Node that should hold the initial focus.
    ///
    /// Prefers the first top-level node with children, then any visible
    /// selectable node (the confirmation node when the plan is empty).
    pub fn first_focus(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&id| self.has_children(id))
            .or_else(|| {
                self.visible_rows()
                    .into_iter()
                    .map(|row| row.id)
                    .find(|&id| self.node(id).selectable)
            })
    }
}

const COLLAPSED_SUFFIXES: [&str; 3] = ["(...)", "[...]", "{...}"];

/// Text with a trailing opening bracket closed by an ellipsis.
pub fn collapsed_text(text: &str) -> String {
    match text.chars().next_back() {
        Some('(') => format!("{text}...)"),
        Some('[') => format!("{text}...]"),
        Some('{') => format!("{text}...}}"),
        _ => text.to_string(),
    }
}

/// Inverse of [`collapsed_text`].
pub fn expanded_text(text: &str) -> String {
    for suffix in COLLAPSED_SUFFIXES {
        if text.ends_with(suffix) {
            // keep the opening bracket
            return text[..text.len() - (suffix.len() - 1)].to_string();
        }
    }
    text.to_string()
}
