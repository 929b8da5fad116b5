//! Keeps the `focusAreas` query parameter and the focus-area selection in step.
//!
//! The parameter holds selected titles joined by [`URL_QUERY_VALUE_SEPARATOR`].
//! Resolver failures never touch the store: the error is logged and returned,
//! and the filter panel keeps showing the previous selection.

use crate::constants::{FOCUS_AREAS_PARAM, URL_QUERY_VALUE_SEPARATOR};
use crate::models::{FocusAreaError, FocusAreaNode, FocusAreaTree};
use crate::store::FilterStore;

/// Split a delimited parameter value into its non-empty parts.
pub fn split_param_values(value: &str) -> Vec<&str> {
    value
        .split(URL_QUERY_VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

pub fn join_param_values<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values
        .into_iter()
        .collect::<Vec<_>>()
        .join(URL_QUERY_VALUE_SEPARATOR)
}

/// Nodes named by a delimited list of titles. Unknown titles are skipped.
pub fn selection_from_titles<'a>(tree: &'a FocusAreaTree, titles: &str) -> Vec<&'a FocusAreaNode> {
    let mut selection: Vec<&FocusAreaNode> = Vec::new();
    for title in split_param_values(titles) {
        match tree.find_by_title(title) {
            Some(node) if !selection.iter().any(|n| n.uid == node.uid) => selection.push(node),
            Some(_) => {}
            None => {
                tracing::debug!(title, "ignoring unknown focus area title");
            }
        }
    }
    selection
}

/// Current focus-area selection held by `store`.
pub fn selected_focus_areas<'a>(tree: &'a FocusAreaTree, store: &FilterStore) -> Vec<&'a FocusAreaNode> {
    store
        .get_param(FOCUS_AREAS_PARAM)
        .map(|titles| selection_from_titles(tree, &titles))
        .unwrap_or_default()
}

/// Apply a click on the focus area `clicked_uid` and write the result back.
///
/// Returns the titles now selected. An empty selection removes the parameter.
pub fn toggle_focus_area(
    tree: &FocusAreaTree,
    store: &FilterStore,
    clicked_uid: &str,
) -> Result<Vec<String>, FocusAreaError> {
    let selection = selected_focus_areas(tree, store);

    let next = match tree.toggle(&selection, clicked_uid) {
        Ok(next) => next,
        Err(err) => {
            tracing::warn!(
                namespace = store.namespace(),
                clicked_uid,
                error = %err,
                "focus area toggle failed, keeping previous selection"
            );
            return Err(err);
        }
    };

    let titles: Vec<String> = next.iter().map(|node| node.title.clone()).collect();
    let value = join_param_values(titles.iter().map(String::as_str));
    store.set_param(FOCUS_AREAS_PARAM, Some(&value));

    Ok(titles)
}
