use crate::constants::URL_QUERY_VALUE_SEPARATOR;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FocusAreaError {
    #[error("Duplicate focus area uid: {0}")]
    DuplicateUid(String),

    #[error("Focus area {uid} declares parent {declared:?} but is nested under {actual}")]
    ParentMismatch {
        uid: String,
        declared: Option<String>,
        actual: String,
    },

    #[error("Focus area {uid} references unknown parent {parent}")]
    DanglingParent { uid: String, parent: String },

    #[error("Focus area {0} is not reachable from any root")]
    Unreachable(String),

    #[error("Parent cycle detected at focus area {0}")]
    Cycle(String),

    #[error("Unknown focus area uid: {0}")]
    UnknownUid(String),

    #[error("Focus areas {first} and {second} share the title {title:?}")]
    DuplicateTitle {
        title: String,
        first: String,
        second: String,
    },

    #[error("Focus area {uid} has a title that cannot be stored in a query param: {title:?}")]
    InvalidTitle { uid: String, title: String },
}

/// A topic category used to filter teams and projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusAreaNode {
    pub uid: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_uid: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<FocusAreaNode>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FocusAreaNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<FocusAreaNode>>::deserialize(deserializer)?.unwrap_or_default())
}

impl FocusAreaNode {
    pub fn new(uid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            parent_uid: None,
            children: Vec::new(),
        }
    }

    /// Attach children, pointing each child's `parent_uid` at this node.
    pub fn with_children(mut self, children: impl IntoIterator<Item = FocusAreaNode>) -> Self {
        for mut child in children {
            child.parent_uid = Some(self.uid.clone());
            self.children.push(child);
        }
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_uid.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A validated focus-area forest with uid and title lookup.
///
/// Construction rejects anything the resolver could trip over: duplicate uids,
/// children whose `parent_uid` disagrees with where they are nested, parents
/// that do not exist and parent chains that loop back on themselves.
///
/// Selections travel through the URL as titles, so titles must also be unique,
/// non-empty, free of [`URL_QUERY_VALUE_SEPARATOR`] and without surrounding
/// whitespace.
#[derive(Debug, Clone, Default)]
pub struct FocusAreaTree {
    roots: Vec<FocusAreaNode>,
    /// uid -> child indexes from `roots` down to the node
    paths: HashMap<String, Vec<usize>>,
    /// title -> uid
    titles: HashMap<String, String>,
}

impl FocusAreaTree {
    /// Build from nested records as returned by the focus-area endpoint.
    ///
    /// Top-level entries with a `parent_uid` are accepted as long as the same
    /// uid also appears nested under a root; they are not treated as roots.
    pub fn new(nodes: Vec<FocusAreaNode>) -> Result<Self, FocusAreaError> {
        let (roots, detached): (Vec<_>, Vec<_>) = nodes.into_iter().partition(|n| n.is_root());

        let mut tree = Self {
            roots,
            ..Self::default()
        };
        tree.build_index()?;

        if let Some(node) = detached.iter().find(|n| !tree.paths.contains_key(&n.uid)) {
            return Err(FocusAreaError::Unreachable(node.uid.clone()));
        }

        Ok(tree)
    }

    /// Build from flat `{uid, title, parentUid}` records. Any `children` on the
    /// records are ignored; nesting comes from `parent_uid` alone.
    pub fn from_flat(records: impl IntoIterator<Item = FocusAreaNode>) -> Result<Self, FocusAreaError> {
        let records: Vec<FocusAreaNode> = records.into_iter().collect();

        let mut known = HashSet::new();
        for record in &records {
            if !known.insert(record.uid.as_str()) {
                return Err(FocusAreaError::DuplicateUid(record.uid.clone()));
            }
        }

        let mut children_of: HashMap<&str, Vec<&FocusAreaNode>> = HashMap::new();
        for record in &records {
            if let Some(parent) = &record.parent_uid {
                if !known.contains(parent.as_str()) {
                    return Err(FocusAreaError::DanglingParent {
                        uid: record.uid.clone(),
                        parent: parent.clone(),
                    });
                }
                children_of.entry(parent.as_str()).or_default().push(record);
            }
        }

        let mut placed = HashSet::new();
        let roots: Vec<FocusAreaNode> = records
            .iter()
            .filter(|r| r.is_root())
            .map(|r| nest(r, &children_of, &mut placed))
            .collect();

        // Whatever was never placed hangs off a parent chain with no root
        if let Some(record) = records.iter().find(|r| !placed.contains(r.uid.as_str())) {
            return Err(FocusAreaError::Cycle(record.uid.clone()));
        }

        let mut tree = Self {
            roots,
            ..Self::default()
        };
        tree.build_index()?;
        Ok(tree)
    }

    fn build_index(&mut self) -> Result<(), FocusAreaError> {
        let mut paths = HashMap::new();
        let mut titles = HashMap::new();
        let mut path = Vec::new();

        for (index, root) in self.roots.iter().enumerate() {
            path.push(index);
            index_node(root, &mut path, &mut paths, &mut titles)?;
            path.pop();
        }

        self.paths = paths;
        self.titles = titles;
        Ok(())
    }

    pub fn roots(&self) -> &[FocusAreaNode] {
        &self.roots
    }

    /// Total number of nodes across all roots.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn find(&self, uid: &str) -> Option<&FocusAreaNode> {
        let path = self.paths.get(uid)?;
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }

    pub fn find_by_title(&self, title: &str) -> Option<&FocusAreaNode> {
        self.titles.get(title).and_then(|uid| self.find(uid))
    }

    /// Depth of a node, roots being at depth 0.
    pub fn depth(&self, uid: &str) -> Option<usize> {
        self.paths.get(uid).map(|path| path.len() - 1)
    }

    /// All nodes, depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &FocusAreaNode> {
        let mut stack: Vec<&FocusAreaNode> = self.roots.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

fn index_node(
    node: &FocusAreaNode,
    path: &mut Vec<usize>,
    paths: &mut HashMap<String, Vec<usize>>,
    titles: &mut HashMap<String, String>,
) -> Result<(), FocusAreaError> {
    if paths.insert(node.uid.clone(), path.clone()).is_some() {
        return Err(FocusAreaError::DuplicateUid(node.uid.clone()));
    }
    check_title(node)?;
    if let Some(first) = titles.insert(node.title.clone(), node.uid.clone()) {
        return Err(FocusAreaError::DuplicateTitle {
            title: node.title.clone(),
            first,
            second: node.uid.clone(),
        });
    }

    for (index, child) in node.children.iter().enumerate() {
        if child.parent_uid.as_deref() != Some(node.uid.as_str()) {
            return Err(FocusAreaError::ParentMismatch {
                uid: child.uid.clone(),
                declared: child.parent_uid.clone(),
                actual: node.uid.clone(),
            });
        }
        path.push(index);
        index_node(child, path, paths, titles)?;
        path.pop();
    }

    Ok(())
}

/// A title has to read back unchanged after being joined into `focusAreas`.
fn check_title(node: &FocusAreaNode) -> Result<(), FocusAreaError> {
    let title = node.title.as_str();
    if title.is_empty() || title.trim() != title || title.contains(URL_QUERY_VALUE_SEPARATOR) {
        return Err(FocusAreaError::InvalidTitle {
            uid: node.uid.clone(),
            title: title.to_string(),
        });
    }
    Ok(())
}

fn nest<'a>(
    record: &'a FocusAreaNode,
    children_of: &HashMap<&str, Vec<&'a FocusAreaNode>>,
    placed: &mut HashSet<&'a str>,
) -> FocusAreaNode {
    placed.insert(record.uid.as_str());

    let children = children_of
        .get(record.uid.as_str())
        .map(|children| {
            children
                .iter()
                .map(|child| nest(child, children_of, placed))
                .collect()
        })
        .unwrap_or_default();

    FocusAreaNode {
        uid: record.uid.clone(),
        title: record.title.clone(),
        parent_uid: record.parent_uid.clone(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> FocusAreaTree {
        FocusAreaTree::new(vec![
            FocusAreaNode::new("pg", "Public Goods").with_children([
                FocusAreaNode::new("oss", "Open Source"),
                FocusAreaNode::new("edu", "Education")
                    .with_children([FocusAreaNode::new("research", "Research")]),
            ]),
            FocusAreaNode::new("ai", "AI"),
        ])
        .unwrap()
    }

    fn flat(uid: &str, title: &str, parent: Option<&str>) -> FocusAreaNode {
        FocusAreaNode {
            uid: uid.to_string(),
            title: title.to_string(),
            parent_uid: parent.map(str::to_string),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_lookup_by_uid_and_title() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.find("research").unwrap().title, "Research");
        assert_eq!(tree.find_by_title("Open Source").unwrap().uid, "oss");
        assert!(tree.find("missing").is_none());
        assert_eq!(tree.depth("research"), Some(2));
        assert_eq!(tree.depth("ai"), Some(0));
    }

    #[test]
    fn test_iter_is_preorder() {
        let tree = sample_tree();
        let uids: Vec<&str> = tree.iter().map(|n| n.uid.as_str()).collect();
        assert_eq!(uids, vec!["pg", "oss", "edu", "research", "ai"]);
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let err = FocusAreaTree::new(vec![
            FocusAreaNode::new("a", "A").with_children([FocusAreaNode::new("b", "B")]),
            FocusAreaNode::new("b", "B again"),
        ])
        .unwrap_err();
        assert_eq!(err, FocusAreaError::DuplicateUid("b".to_string()));
    }

    #[test]
    fn test_parent_mismatch_rejected() {
        let mut root = FocusAreaNode::new("a", "A");
        root.children.push(flat("b", "B", Some("elsewhere")));
        let err = FocusAreaTree::new(vec![root]).unwrap_err();
        assert!(matches!(err, FocusAreaError::ParentMismatch { ref uid, .. } if uid == "b"));
    }

    #[test]
    fn test_detached_top_level_entries() {
        // The endpoint lists children both nested and at top level
        let root = FocusAreaNode::new("a", "A").with_children([FocusAreaNode::new("b", "B")]);
        let tree = FocusAreaTree::new(vec![root, flat("b", "B", Some("a"))]).unwrap();
        assert_eq!(tree.roots().len(), 1);
        assert_eq!(tree.len(), 2);

        let err = FocusAreaTree::new(vec![flat("c", "C", Some("a"))]).unwrap_err();
        assert_eq!(err, FocusAreaError::Unreachable("c".to_string()));
    }

    #[test]
    fn test_from_flat_records() {
        let tree = FocusAreaTree::from_flat(vec![
            flat("research", "Research", Some("edu")),
            flat("pg", "Public Goods", None),
            flat("edu", "Education", Some("pg")),
        ])
        .unwrap();
        assert_eq!(tree.roots().len(), 1);
        assert_eq!(tree.depth("research"), Some(2));
        assert_eq!(tree.find("edu").unwrap().children[0].uid, "research");
    }

    #[test]
    fn test_from_flat_detects_cycle() {
        let err = FocusAreaTree::from_flat(vec![
            flat("root", "Root", None),
            flat("a", "A", Some("b")),
            flat("b", "B", Some("a")),
        ])
        .unwrap_err();
        assert!(matches!(err, FocusAreaError::Cycle(_)));
    }

    #[test]
    fn test_from_flat_dangling_parent() {
        let err = FocusAreaTree::from_flat(vec![flat("a", "A", Some("ghost"))]).unwrap_err();
        assert_eq!(
            err,
            FocusAreaError::DanglingParent {
                uid: "a".to_string(),
                parent: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_title_rejected() {
        let err = FocusAreaTree::new(vec![
            FocusAreaNode::new("a", "A").with_children([FocusAreaNode::new("a-other", "Other")]),
            FocusAreaNode::new("b", "B").with_children([FocusAreaNode::new("b-other", "Other")]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            FocusAreaError::DuplicateTitle {
                title: "Other".to_string(),
                first: "a-other".to_string(),
                second: "b-other".to_string(),
            }
        );

        let err = FocusAreaTree::from_flat(vec![
            flat("a", "A", None),
            flat("a-other", "Other", Some("a")),
            flat("b-other", "Other", None),
        ])
        .unwrap_err();
        assert!(matches!(err, FocusAreaError::DuplicateTitle { ref title, .. } if title == "Other"));
    }

    #[test]
    fn test_titles_must_survive_the_query_param() {
        for title in ["DeSci|Bio", " Padded", "Padded ", ""] {
            let err = FocusAreaTree::new(vec![FocusAreaNode::new("x", title)]).unwrap_err();
            assert_eq!(
                err,
                FocusAreaError::InvalidTitle {
                    uid: "x".to_string(),
                    title: title.to_string(),
                }
            );
        }

        let err = FocusAreaTree::from_flat(vec![
            flat("root", "Root", None),
            flat("bio", "DeSci|Bio", Some("root")),
        ])
        .unwrap_err();
        assert!(matches!(err, FocusAreaError::InvalidTitle { ref uid, .. } if uid == "bio"));
    }

    #[test]
    fn test_deserialize_camel_case_and_null_children() {
        let json = r#"[
            {"uid": "a", "title": "A", "children": [
                {"uid": "b", "title": "B", "parentUid": "a", "children": null}
            ]},
            {"uid": "c", "title": "C"}
        ]"#;
        let nodes: Vec<FocusAreaNode> = serde_json::from_str(json).unwrap();
        assert!(nodes[0].children[0].is_leaf());
        assert!(nodes[1].is_leaf());

        let tree = FocusAreaTree::new(nodes).unwrap();
        assert_eq!(tree.find("b").unwrap().parent_uid.as_deref(), Some("a"));
    }
}
