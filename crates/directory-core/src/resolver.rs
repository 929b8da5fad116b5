//! Ancestor/descendant resolution over focus-area trees.
//!
//! A selection never holds a node together with one of its ancestors or
//! descendants: picking a parent means "everything under it", so [`toggle`]
//! drops any related selections before adding the clicked node.
//!
//! The free functions accept raw node slices as delivered by the API. Only
//! entries without a `parent_uid` are walked as roots. Every walk carries a
//! visited set, so a uid met twice comes back as
//! [`FocusAreaError::DuplicateUid`] instead of being counted twice.

use crate::models::{FocusAreaError, FocusAreaNode, FocusAreaTree};
use std::collections::HashSet;

/// Nodes on the paths from a root down to each selected node (exclusive),
/// deduplicated by uid in first-seen order.
///
/// A selected node that cannot be found under any root contributes nothing.
pub fn ancestors<'a>(
    tree: &'a [FocusAreaNode],
    selection: &[&FocusAreaNode],
) -> Result<Vec<&'a FocusAreaNode>, FocusAreaError> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for selected in selection {
        let mut visited = HashSet::new();
        for root in tree.iter().filter(|node| node.is_root()) {
            let mut path = Vec::new();
            if find_path(root, &selected.uid, &mut path, &mut visited)? {
                for node in path {
                    if seen.insert(node.uid.as_str()) {
                        result.push(node);
                    }
                }
            }
        }
    }

    Ok(result)
}

fn find_path<'a>(
    node: &'a FocusAreaNode,
    target: &str,
    path: &mut Vec<&'a FocusAreaNode>,
    visited: &mut HashSet<&'a str>,
) -> Result<bool, FocusAreaError> {
    if !visited.insert(node.uid.as_str()) {
        return Err(FocusAreaError::DuplicateUid(node.uid.clone()));
    }
    if node.uid == target {
        return Ok(true);
    }

    path.push(node);
    for child in &node.children {
        if find_path(child, target, path, visited)? {
            return Ok(true);
        }
    }
    path.pop();

    Ok(false)
}

/// Every node below `node`, depth-first pre-order. Leaves yield an empty list.
pub fn descendants(node: &FocusAreaNode) -> Result<Vec<&FocusAreaNode>, FocusAreaError> {
    let mut visited = HashSet::from([node.uid.as_str()]);
    let mut result = Vec::new();
    collect_descendants(node, &mut visited, &mut result)?;
    Ok(result)
}

fn collect_descendants<'a>(
    node: &'a FocusAreaNode,
    visited: &mut HashSet<&'a str>,
    result: &mut Vec<&'a FocusAreaNode>,
) -> Result<(), FocusAreaError> {
    for child in &node.children {
        if !visited.insert(child.uid.as_str()) {
            return Err(FocusAreaError::DuplicateUid(child.uid.clone()));
        }
        result.push(child);
        collect_descendants(child, visited, result)?;
    }
    Ok(())
}

/// Selection after the user clicks `clicked`.
///
/// Deselecting only removes the clicked node. Selecting first removes every
/// selected ancestor and descendant of it, then appends it at the end.
pub fn toggle<'a>(
    tree: &'a [FocusAreaNode],
    selection: &[&'a FocusAreaNode],
    clicked: &'a FocusAreaNode,
) -> Result<Vec<&'a FocusAreaNode>, FocusAreaError> {
    if selection.iter().any(|node| node.uid == clicked.uid) {
        return Ok(selection
            .iter()
            .copied()
            .filter(|node| node.uid != clicked.uid)
            .collect());
    }

    let related: HashSet<&str> = ancestors(tree, &[clicked])?
        .into_iter()
        .chain(descendants(clicked)?)
        .map(|node| node.uid.as_str())
        .collect();

    let mut next: Vec<&'a FocusAreaNode> = selection
        .iter()
        .copied()
        .filter(|node| !related.contains(node.uid.as_str()))
        .collect();
    next.push(clicked);

    Ok(next)
}

/// Uids to render as "partially selected": ancestors of the selection.
pub fn partially_selected<'a>(
    tree: &'a [FocusAreaNode],
    selection: &[&FocusAreaNode],
) -> Result<HashSet<&'a str>, FocusAreaError> {
    Ok(ancestors(tree, selection)?
        .into_iter()
        .map(|node| node.uid.as_str())
        .collect())
}

/// Whether no selected node is an ancestor or descendant of another.
pub fn is_exclusive(selection: &[&FocusAreaNode]) -> Result<bool, FocusAreaError> {
    let selected: HashSet<&str> = selection.iter().map(|node| node.uid.as_str()).collect();
    for node in selection {
        if descendants(node)?
            .iter()
            .any(|below| selected.contains(below.uid.as_str()))
        {
            return Ok(false);
        }
    }
    Ok(true)
}

impl FocusAreaTree {
    pub fn ancestors(&self, selection: &[&FocusAreaNode]) -> Result<Vec<&FocusAreaNode>, FocusAreaError> {
        ancestors(self.roots(), selection)
    }

    /// Descendants of the node with `uid`.
    pub fn descendants(&self, uid: &str) -> Result<Vec<&FocusAreaNode>, FocusAreaError> {
        let node = self
            .find(uid)
            .ok_or_else(|| FocusAreaError::UnknownUid(uid.to_string()))?;
        descendants(node)
    }

    /// [`toggle`] with the clicked node looked up by uid in this tree.
    pub fn toggle<'a>(
        &'a self,
        selection: &[&'a FocusAreaNode],
        clicked_uid: &str,
    ) -> Result<Vec<&'a FocusAreaNode>, FocusAreaError> {
        let clicked = self
            .find(clicked_uid)
            .ok_or_else(|| FocusAreaError::UnknownUid(clicked_uid.to_string()))?;
        toggle(self.roots(), selection, clicked)
    }

    pub fn partially_selected(&self, selection: &[&FocusAreaNode]) -> Result<HashSet<&str>, FocusAreaError> {
        partially_selected(self.roots(), selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uids(nodes: &[&FocusAreaNode]) -> Vec<String> {
        nodes.iter().map(|n| n.uid.clone()).collect()
    }

    /// a -> [b, c -> [d]], e
    fn forest() -> Vec<FocusAreaNode> {
        vec![
            FocusAreaNode::new("a", "A").with_children([
                FocusAreaNode::new("b", "B"),
                FocusAreaNode::new("c", "C").with_children([FocusAreaNode::new("d", "D")]),
            ]),
            FocusAreaNode::new("e", "E"),
        ]
    }

    #[test]
    fn test_descendants_preorder() {
        let nodes = forest();
        assert_eq!(uids(&descendants(&nodes[0]).unwrap()), vec!["b", "c", "d"]);
        assert!(descendants(&nodes[1]).unwrap().is_empty());
    }

    #[test]
    fn test_ancestors_of_deep_node() {
        let nodes = forest();
        let d = &nodes[0].children[1].children[0];
        assert_eq!(uids(&ancestors(&nodes, &[d]).unwrap()), vec!["a", "c"]);
    }

    #[test]
    fn test_ancestors_deduplicated_across_selection() {
        let nodes = forest();
        let b = &nodes[0].children[0];
        let d = &nodes[0].children[1].children[0];
        assert_eq!(uids(&ancestors(&nodes, &[b, d]).unwrap()), vec!["a", "c"]);
    }

    #[test]
    fn test_ancestors_of_root_is_empty() {
        let nodes = forest();
        assert!(ancestors(&nodes, &[&nodes[1]]).unwrap().is_empty());
    }

    #[test]
    fn test_ancestors_of_unknown_node_is_empty() {
        let nodes = forest();
        let stranger = FocusAreaNode::new("zzz", "Nowhere");
        assert!(ancestors(&nodes, &[&stranger]).unwrap().is_empty());
    }

    #[test]
    fn test_non_root_entries_are_not_walked() {
        // a top-level entry that declares a parent is not a root
        let mut nodes = forest();
        let mut loose = FocusAreaNode::new("x", "X");
        loose.parent_uid = Some("a".to_string());
        nodes.push(loose);
        let x = nodes[2].clone();
        assert!(ancestors(&nodes, &[&x]).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_uid_reported() {
        let nodes = vec![
            FocusAreaNode::new("a", "A").with_children([FocusAreaNode::new("dup", "Dup")]),
            FocusAreaNode::new("dup", "Dup again"),
        ];
        let target = FocusAreaNode::new("missing", "Missing");
        let err = ancestors(&nodes, &[&target]).unwrap_err();
        assert_eq!(err, FocusAreaError::DuplicateUid("dup".to_string()));
    }

    #[test]
    fn test_selecting_parent_drops_children() {
        let nodes = forest();
        let a = &nodes[0];
        let b = &a.children[0];
        let selection = toggle(&nodes, &[b], a).unwrap();
        assert_eq!(uids(&selection), vec!["a"]);
    }

    #[test]
    fn test_selecting_child_drops_parent() {
        let nodes = vec![FocusAreaNode::new("a", "A").with_children([FocusAreaNode::new("b", "B")])];
        let a = &nodes[0];
        let b = &a.children[0];
        let selection = toggle(&nodes, &[a], b).unwrap();
        assert_eq!(uids(&selection), vec!["b"]);
    }

    #[test]
    fn test_selecting_keeps_unrelated_nodes() {
        let nodes = forest();
        let b = &nodes[0].children[0];
        let d = &nodes[0].children[1].children[0];
        let e = &nodes[1];
        let selection = toggle(&nodes, &[e, b], d).unwrap();
        assert_eq!(uids(&selection), vec!["e", "b", "d"]);
    }

    #[test]
    fn test_deselect_only_removes_clicked() {
        let nodes = forest();
        let b = &nodes[0].children[0];
        let e = &nodes[1];
        let selection = toggle(&nodes, &[b, e], b).unwrap();
        assert_eq!(uids(&selection), vec!["e"]);
    }

    #[test]
    fn test_deselect_matches_by_uid() {
        let nodes = forest();
        let copy = nodes[1].clone();
        let selection = toggle(&nodes, &[&copy], &nodes[1]).unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let nodes = forest();
        let b = &nodes[0].children[0];
        let e = &nodes[1];
        let once = toggle(&nodes, &[e], b).unwrap();
        let twice = toggle(&nodes, &once, b).unwrap();
        assert_eq!(uids(&twice), vec!["e"]);
    }

    #[test]
    fn test_partially_selected() {
        let nodes = forest();
        let d = &nodes[0].children[1].children[0];
        let partial = partially_selected(&nodes, &[d]).unwrap();
        assert_eq!(partial, HashSet::from(["a", "c"]));
    }

    #[test]
    fn test_is_exclusive() {
        let nodes = forest();
        let a = &nodes[0];
        let d = &a.children[1].children[0];
        let e = &nodes[1];
        assert!(is_exclusive(&[d, e]).unwrap());
        assert!(!is_exclusive(&[a, d]).unwrap());
        assert!(!is_exclusive(&[d, a]).unwrap());
    }

    #[test]
    fn test_tree_methods_lookup_by_uid() {
        let tree = FocusAreaTree::new(forest()).unwrap();
        let selection = tree.toggle(&[], "d").unwrap();
        assert_eq!(uids(&selection), vec!["d"]);

        let selection = tree.toggle(&selection, "c").unwrap();
        assert_eq!(uids(&selection), vec!["c"]);

        assert_eq!(uids(&tree.descendants("a").unwrap()), vec!["b", "c", "d"]);
        assert_eq!(
            tree.toggle(&[], "nope").unwrap_err(),
            FocusAreaError::UnknownUid("nope".to_string())
        );
    }
}
