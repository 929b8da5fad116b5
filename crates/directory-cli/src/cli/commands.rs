use std::path::Path;

use anyhow::{Context, Result};
use directory_core::store::{selected_focus_areas, toggle_focus_area};
use directory_core::{FilterChange, FilterParameters, FilterStore, FocusAreaNode, FocusAreaTree};
use serde_json::{json, Value};

use super::config::StoreProfile;

/// Load a focus-area tree from a JSON array of nodes.
///
/// Nested records (`children`) are used as-is; a list where no record has
/// children is treated as flat `{uid, title, parentUid}` records.
pub fn load_tree(path: &Path) -> Result<FocusAreaTree> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read focus area file: {}", path.display()))?;
    let nodes: Vec<FocusAreaNode> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse focus area file: {}", path.display()))?;

    let tree = if nodes.iter().all(FocusAreaNode::is_leaf) {
        FocusAreaTree::from_flat(nodes)
    } else {
        FocusAreaTree::new(nodes)
    };
    tree.with_context(|| format!("Invalid focus area tree in {}", path.display()))
}

/// Build a store for `profile` seeded from `query`. Analytics reports are logged.
pub fn seeded_store(profile: &StoreProfile, query: &str) -> Result<FilterStore> {
    let params = FilterParameters::from_query_string(query).context("Invalid query string")?;
    let config = profile.to_store_config().with_listener(|change: &FilterChange| {
        tracing::info!(
            key = %change.key,
            value = ?change.value,
            params = %change.params,
            "filter change"
        );
    });

    let store = FilterStore::new(config);
    store.set_all_params(params);
    for key in store.untracked_params() {
        tracing::warn!(namespace = store.namespace(), key = %key, "query sets an untracked param");
    }
    Ok(store)
}

pub fn count(profile: &StoreProfile, query: &str) -> Result<Value> {
    let store = seeded_store(profile, query)?;
    Ok(json!({
        "namespace": store.namespace(),
        "activeFilters": store.active_filter_count(),
    }))
}

pub fn ancestors(tree: &FocusAreaTree, profile: &StoreProfile, query: &str) -> Result<Value> {
    let store = seeded_store(profile, query)?;
    let selection = selected_focus_areas(tree, &store);
    let ancestors = tree
        .ancestors(&selection)
        .context("Failed to resolve ancestors")?;

    Ok(json!({
        "selected": titles(&selection),
        "ancestors": titles(&ancestors),
    }))
}

pub fn descendants(tree: &FocusAreaTree, uid: &str) -> Result<Value> {
    let descendants = tree
        .descendants(uid)
        .with_context(|| format!("Failed to resolve descendants of {}", uid))?;
    Ok(json!({
        "uid": uid,
        "descendants": titles(&descendants),
    }))
}

/// Toggle `uid` in the `focusAreas` selection and return the new query string.
pub fn toggle(tree: &FocusAreaTree, profile: &StoreProfile, query: &str, uid: &str) -> Result<Value> {
    let store = seeded_store(profile, query)?;
    let selected = toggle_focus_area(tree, &store, uid)
        .with_context(|| format!("Failed to toggle focus area {}", uid))?;
    // Report now rather than wait out the debounce window before exit
    store.flush();

    Ok(json!({
        "selected": selected,
        "query": store.to_query_string(),
    }))
}

pub fn validate(tree: &FocusAreaTree) -> Value {
    let leaves = tree.iter().filter(|node| node.is_leaf()).count();
    let max_depth = tree
        .iter()
        .filter_map(|node| tree.depth(&node.uid))
        .max()
        .unwrap_or(0);
    json!({
        "roots": tree.roots().len(),
        "nodes": tree.len(),
        "leaves": leaves,
        "maxDepth": max_depth,
    })
}

fn titles(nodes: &[&FocusAreaNode]) -> Vec<String> {
    nodes.iter().map(|node| node.title.clone()).collect()
}
