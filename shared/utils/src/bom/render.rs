//! ASCII rendering of an assembly tree.

use multibom_models::{BomTree, NodeId};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// One line per node, children indented under their parent in attachment
/// order:
///
/// ```text
/// master.xlsx (3 items)
/// ├── frame.xlsx (2 items)
/// │   └── tube.xlsx (1 items)
/// └── wheel.xlsx (4 items)
/// ```
pub fn render_tree(tree: &BomTree, root: NodeId) -> String {
    let mut out = format!("{}\n", tree.node(root));
    render_children(tree, root, "", &mut out);
    out
}

fn render_children(tree: &BomTree, id: NodeId, prefix: &str, out: &mut String) {
    let children: Vec<NodeId> = tree.children(id).collect();
    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if last { LAST_BRANCH } else { BRANCH });
        out.push_str(&tree.node(child).to_string());
        out.push('\n');

        let next_prefix = format!("{}{}", prefix, if last { SPACE } else { PIPE });
        render_children(tree, child, &next_prefix, out);
    }
}
