use crate::error::{Result, ViewerError};
use crate::node::{Node, NodeKind};
use log::debug;

/// A layered document: canvas size plus a forest of nodes.
///
/// Nodes live in an arena indexed by their position in the flat export;
/// groups refer to their children by index. Child and root lists keep
/// declaration order, which is the paint order reversed.
#[derive(Clone, Debug, Default)]
pub struct Document {
    width: u32,
    height: u32,
    nodes: Vec<Node>,
    roots: Vec<usize>,
}

/// Assembles a document from nodes in flat export order.
///
/// Each node is appended to the root list or to its parent's child list in a
/// single forward pass. A parent has to be a group that appears earlier in
/// the list, so a successful build is always acyclic.
pub fn build(width: i64, height: i64, mut nodes: Vec<Node>) -> Result<Document> {
    let width = canvas_extent(width, "width")?;
    let height = canvas_extent(height, "height")?;
    if (width as usize).checked_mul(height as usize).and_then(|n| n.checked_mul(4)).is_none() {
        return Err(ViewerError::invalid_tree(format!("document of {}x{} pixels does not fit in memory", width, height)));
    }
    let len = nodes.len();
    let mut roots = Vec::new();

    for i in 0..len {
        if nodes[i].index != i {
            return Err(ViewerError::invalid_tree(format!("node at position {} claims index {}", i, nodes[i].index)));
        }
        let parent = match nodes[i].parent_index {
            None => {
                roots.push(i);
                continue;
            }
            Some(p) => p,
        };
        if parent < 0 || parent as usize >= len {
            return Err(ViewerError::invalid_tree(format!("node {}: parent index {} out of range 0..{}", i, parent, len)));
        }
        let parent = parent as usize;
        if parent == i {
            return Err(ViewerError::invalid_tree(format!("node {} is its own parent", i)));
        }
        if parent > i {
            return Err(ViewerError::invalid_tree(format!("node {}: parent {} is declared after its child", i, parent)));
        }
        match &mut nodes[parent].kind {
            NodeKind::Group { children, .. } => children.push(i),
            NodeKind::Layer { .. } => {
                return Err(ViewerError::invalid_tree(format!("node {}: parent {} is a layer, not a group", i, parent)));
            }
        }
    }

    debug!("built document {}x{} with {} nodes, {} roots", width, height, len, roots.len());
    Ok(Document { width, height, nodes, roots })
}

fn canvas_extent(v: i64, what: &str) -> Result<u32> {
    if v <= 0 || v > u32::MAX as i64 {
        return Err(ViewerError::invalid_tree(format!("document {} must be a positive integer, got {}", what, v)));
    }
    Ok(v as u32)
}

impl Document {
    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn roots(&self) -> &[usize] { &self.roots }
    pub fn node(&self, index: usize) -> Option<&Node> { self.nodes.get(index) }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Depth-first walk in declaration order (topmost first), with nesting depth.
    pub fn walk(&self) -> Vec<(usize, &Node)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&i| (0, i)).collect();
        while let Some((depth, i)) = stack.pop() {
            let Some(node) = self.nodes.get(i) else { continue };
            out.push((depth, node));
            stack.extend(node.children().iter().rev().map(|&c| (depth + 1, c)));
        }
        out
    }

    /// Drops every node and pixel buffer. The document renders nothing afterwards.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.width = 0;
        self.height = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeRecord;
    use serde_json::json;

    fn node(i: usize, node_type: &str, parent: Option<i64>) -> Node {
        let record: NodeRecord = serde_json::from_value(json!({ "type": node_type, "name": format!("n{}", i), "parentIndex": parent })).unwrap();
        Node::new(&record, i, None).unwrap()
    }

    #[test]
    fn children_keep_declaration_order() {
        let doc = build(4, 4, vec![node(0, "group", None), node(1, "layer", Some(0)), node(2, "layer", Some(0))]).unwrap();
        assert_eq!(doc.roots(), &[0]);
        assert_eq!(doc.node(0).unwrap().children(), &[1, 2]);
        assert!(doc.node(2).unwrap().children().is_empty());
    }

    #[test]
    fn several_roots_keep_order() {
        let doc = build(1, 1, vec![node(0, "layer", None), node(1, "group", None), node(2, "layer", Some(1)), node(3, "layer", None)]).unwrap();
        assert_eq!(doc.roots(), &[0, 1, 3]);
    }

    #[test]
    fn self_parent_is_invalid() {
        let err = build(1, 1, vec![node(0, "group", None), node(1, "group", Some(1))]).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidTree(_)));
    }

    #[test]
    fn out_of_range_parent_is_invalid() {
        for p in [-1, 2, 99] {
            let err = build(1, 1, vec![node(0, "group", None), node(1, "layer", Some(p))]).unwrap_err();
            assert!(matches!(err, ViewerError::InvalidTree(_)), "parent {}", p);
        }
    }

    #[test]
    fn forward_reference_is_invalid() {
        let err = build(1, 1, vec![node(0, "layer", Some(1)), node(1, "group", None)]).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidTree(_)));
    }

    #[test]
    fn layer_parent_is_invalid() {
        let err = build(1, 1, vec![node(0, "layer", None), node(1, "layer", Some(0))]).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidTree(_)));
    }

    #[test]
    fn mismatched_index_is_invalid() {
        let err = build(1, 1, vec![node(0, "group", None), node(0, "layer", None)]).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidTree(_)));
    }

    #[test]
    fn empty_canvas_is_invalid() {
        assert!(matches!(build(0, 5, vec![]).unwrap_err(), ViewerError::InvalidTree(_)));
        assert!(matches!(build(5, -1, vec![]).unwrap_err(), ViewerError::InvalidTree(_)));
        assert!(build(5, 5, vec![]).unwrap().is_empty());
    }

    #[test]
    fn canvas_too_large_to_address_is_invalid() {
        let side = u32::MAX as i64;
        assert!(matches!(build(side, side, vec![]).unwrap_err(), ViewerError::InvalidTree(_)));
        assert!(matches!(build(side + 1, 1, vec![]).unwrap_err(), ViewerError::InvalidTree(_)));
    }

    #[test]
    fn walk_is_depth_first_in_declaration_order() {
        let doc = build(1, 1, vec![
            node(0, "group", None),
            node(1, "group", Some(0)),
            node(2, "layer", Some(1)),
            node(3, "layer", Some(0)),
            node(4, "layer", None),
        ]).unwrap();
        let order: Vec<(usize, usize)> = doc.walk().into_iter().map(|(d, n)| (d, n.index)).collect();
        assert_eq!(order, vec![(0, 0), (1, 1), (2, 2), (1, 3), (0, 4)]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut doc = build(3, 3, vec![node(0, "layer", None)]).unwrap();
        doc.clear();
        assert!(doc.is_empty());
        assert!(doc.roots().is_empty());
        assert_eq!((doc.width(), doc.height()), (0, 0));
    }
}
