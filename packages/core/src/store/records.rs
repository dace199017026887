//! Flat Record Export/Import
//!
//! Persistence is an external concern; the core only defines a full-fidelity
//! flat record set: every node, its parent link with position, and its text
//! runs. Callers serialize the records however they like (they are plain
//! serde types) and hand them back on load.

use serde::{Deserialize, Serialize};

use crate::models::{Node, ParentLink, TextRun};
use crate::store::text::TextStore;
use crate::store::tree::TreeStore;

/// One node's complete persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub node: Node,
    pub link: ParentLink,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<TextRun>,
}

/// Export every node as a flat record, ordered by id for determinism.
pub fn export_records(tree: &TreeStore, text: &TextStore) -> Vec<NodeRecord> {
    let mut ids = tree.node_ids();
    ids.sort();
    ids.into_iter()
        .filter_map(|id| {
            let node = tree.node(&id)?.clone();
            let link = tree.link(&id)?.clone();
            let runs = text.log(&id).map(|l| l.runs().to_vec()).unwrap_or_default();
            Some(NodeRecord { node, link, runs })
        })
        .collect()
}

/// Import a flat record set, restoring nodes, links and text logs verbatim.
pub fn import_records(records: Vec<NodeRecord>, tree: &mut TreeStore, text: &mut TextStore) {
    for record in records {
        let id = record.node.id.clone();
        tree.restore(record.node, record.link);
        if !record.runs.is_empty() {
            text.restore(&id, record.runs);
        }
    }
}
