//! Chart-ready projections of a confusion table.
//!
//! Every function here is a pure view over a (possibly pre-filtered) slice
//! of [`ConfusionEntry`] rows; nothing is cached or persisted.

pub mod filter;
pub mod payload;

pub use filter::{
    parse_keywords, select_word, ConfusionFilter, ConfusionSummary, ErrorQuery, WordMode,
};
pub use payload::{keyword_views, DashboardPayload, DashboardQuery, KeywordView};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{Category, ConfusionEntry, Slot};

pub const RED_NODE: &str = "rgba(214, 39, 40, 0.8)";
pub const YELLOW_NODE: &str = "rgba(188, 189, 34, 0.8)";
pub const BLUE_NODE: &str = "rgba(31, 119, 180, 0.8)";
pub const RED_LINK: &str = "rgba(214, 39, 40, 0.2)";
pub const YELLOW_LINK: &str = "rgba(188, 189, 34, 0.2)";

pub const GREEN_PIE: &str = "rgb(0, 204, 150)";
pub const RED_PIE: &str = "rgb(239, 85, 59)";
pub const BLUE_PIE: &str = "rgb(99, 110, 250)";
pub const YELLOW_PIE: &str = "rgb(254, 203, 82)";

/// Node label used for an absent word.
pub const DELETED_LABEL: &str = "DELETED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub label: Category,
    pub value: u64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: u64,
    pub label: String,
    pub color: String,
}

/// Source → destination flow diagram.
///
/// Nodes `0..S` are the distinct sources in first-appearance order, nodes
/// `S..` the distinct destinations. A word on both sides gets two nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarPoint {
    pub x: String,
    pub y: u64,
    pub color: String,
}

fn pie_color(category: Category) -> &'static str {
    match category {
        Category::Deletions => RED_PIE,
        Category::Correct => GREEN_PIE,
        Category::Insertions => BLUE_PIE,
        Category::Substitutions => YELLOW_PIE,
    }
}

/// Summed count per category present in `entries`, in label order.
pub fn pie_series(entries: &[ConfusionEntry]) -> Vec<PieSlice> {
    let mut sums: HashMap<Category, u64> = HashMap::new();
    for entry in entries {
        *sums.entry(entry.category).or_insert(0) += entry.count;
    }
    let mut slices: Vec<PieSlice> = sums
        .into_iter()
        .map(|(label, value)| PieSlice {
            label,
            value,
            color: pie_color(label).to_string(),
        })
        .collect();
    slices.sort_by(|a, b| a.label.as_str().cmp(b.label.as_str()));
    slices
}

/// One link per row, nodes indexed per side.
pub fn flow_graph(entries: &[ConfusionEntry]) -> FlowGraph {
    let sources = distinct(entries.iter().map(|e| &e.source));
    let destinations = distinct(entries.iter().map(|e| &e.destination));
    let offset = sources.len();

    let index = |side: &[&Slot], slot: &Slot| side.iter().position(|s| *s == slot);

    let nodes = sources
        .iter()
        .chain(destinations.iter())
        .map(|slot| node(slot))
        .collect();

    let links = entries
        .iter()
        .filter_map(|e| {
            let source = index(&sources, &e.source)?;
            let target = offset + index(&destinations, &e.destination)?;
            let color = if e.destination.is_absent() {
                RED_LINK
            } else {
                YELLOW_LINK
            };
            Some(FlowLink {
                source,
                target,
                value: e.count,
                label: e.count.to_string(),
                color: color.to_string(),
            })
        })
        .collect();

    FlowGraph { nodes, links }
}

/// Per-row bars: x = source label, y = count, colored by category.
pub fn bar_series(entries: &[ConfusionEntry]) -> Vec<BarPoint> {
    entries
        .iter()
        .map(|e| {
            let color = match e.category {
                Category::Substitutions => YELLOW_NODE,
                Category::Deletions => RED_NODE,
                _ => BLUE_NODE,
            };
            BarPoint {
                x: e.source.label().to_string(),
                y: e.count,
                color: color.to_string(),
            }
        })
        .collect()
}

fn distinct<'a>(slots: impl Iterator<Item = &'a Slot>) -> Vec<&'a Slot> {
    let mut seen: Vec<&Slot> = Vec::new();
    for slot in slots {
        if !seen.contains(&slot) {
            seen.push(slot);
        }
    }
    seen
}

fn node(slot: &Slot) -> FlowNode {
    match slot {
        Slot::Absent => FlowNode {
            label: DELETED_LABEL.to_string(),
            color: RED_NODE.to_string(),
        },
        Slot::Word(w) => FlowNode {
            label: w.clone(),
            color: YELLOW_NODE.to_string(),
        },
    }
}
