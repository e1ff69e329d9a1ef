//! Dashboard payload: every derived view of one query, serialized as
//! camelCase JSON for a frontend.

use serde::{Deserialize, Serialize};

use crate::aggregate::{Category, ConfusionEntry};
use crate::analysis::ErrorRecord;

use super::filter::{select_word, ConfusionFilter, ConfusionSummary, ErrorQuery, WordMode};
use super::{bar_series, flow_graph, pie_series, BarPoint, FlowGraph, PieSlice};

/// What the dashboard is looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardQuery {
    pub filter: ConfusionFilter,
    /// Selected word. `None` selects nothing.
    pub word: Option<String>,
    pub mode: WordMode,
    /// Word on the opposite side of `word`, narrowing the drill-down.
    pub counterpart: Option<String>,
    /// Drill-down category. Defaults to substitutions.
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    /// Headline numbers of the whole table, independent of the filter.
    pub summary: ConfusionSummary,
    /// Rows passing the filter.
    pub rows: Vec<ConfusionEntry>,
    /// Rows of the whole table matching the selected word.
    pub selected: Vec<ConfusionEntry>,
    /// Category split of the selection.
    pub pie: Vec<PieSlice>,
    /// Substitution flow of the selection.
    pub flow: FlowGraph,
    /// One bar per filtered row.
    pub bars: Vec<BarPoint>,
    /// Error records behind the selection.
    pub errors: Vec<ErrorRecord>,
}

impl DashboardPayload {
    pub fn build(
        entries: &[ConfusionEntry],
        errors: &[ErrorRecord],
        query: &DashboardQuery,
    ) -> Self {
        let rows = query.filter.apply(entries);
        let selected = match query.word.as_deref() {
            Some(word) => select_word(entries, word, query.mode),
            None => Vec::new(),
        };

        let substitutions: Vec<ConfusionEntry> = selected
            .iter()
            .filter(|e| e.category == Category::Substitutions)
            .cloned()
            .collect();

        let (source_word, destination_word) = match query.mode {
            WordMode::Reference => (query.word.clone(), query.counterpart.clone()),
            WordMode::Hypothesis => (query.counterpart.clone(), query.word.clone()),
        };
        let drill_down = ErrorQuery {
            category: query.category.unwrap_or(Category::Substitutions),
            source_word,
            destination_word,
        };

        Self {
            summary: ConfusionSummary::from_entries(entries),
            pie: pie_series(&selected),
            flow: flow_graph(&substitutions),
            bars: bar_series(&rows),
            errors: drill_down.select(errors).into_iter().cloned().collect(),
            rows,
            selected,
        }
    }
}

/// Dashboard view seeded by one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordView {
    pub keyword: String,
    pub payload: DashboardPayload,
}

/// One view per keyword, each selecting the keyword as the reference word.
/// The rest of `base` (filter, counterpart, category) is shared.
pub fn keyword_views(
    entries: &[ConfusionEntry],
    errors: &[ErrorRecord],
    base: &DashboardQuery,
    keywords: &[String],
) -> Vec<KeywordView> {
    keywords
        .iter()
        .map(|keyword| {
            let query = DashboardQuery {
                word: Some(keyword.clone()),
                mode: WordMode::Reference,
                ..base.clone()
            };
            KeywordView {
                keyword: keyword.clone(),
                payload: DashboardPayload::build(entries, errors, &query),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Slot;
    use crate::align::ChunkKind;
    use crate::normalize::Channel;

    fn entry(src: &str, dst: &str, count: u64, category: Category) -> ConfusionEntry {
        ConfusionEntry {
            source: Slot::from_label(src),
            destination: Slot::from_label(dst),
            count,
            category,
        }
    }

    fn table() -> Vec<ConfusionEntry> {
        vec![
            entry("cat", "bat", 2, Category::Substitutions),
            entry("cat", "cat", 6, Category::Correct),
            entry("cat", "NIL", 1, Category::Deletions),
            entry("dog", "dot", 3, Category::Substitutions),
        ]
    }

    fn errors() -> Vec<ErrorRecord> {
        vec![ErrorRecord {
            file_id: "call-2".into(),
            channel: Channel::Left,
            ref_context_before: "the".into(),
            ref_word: "cat".into(),
            ref_context_after: "sat".into(),
            hyp_context_before: "the".into(),
            hyp_word: "bat".into(),
            hyp_context_after: "sat".into(),
            error_type: ChunkKind::Substitute,
        }]
    }

    #[test]
    fn word_query_narrows_every_view() {
        let query = DashboardQuery {
            word: Some("cat".into()),
            ..DashboardQuery::default()
        };
        let payload = DashboardPayload::build(&table(), &errors(), &query);
        assert_eq!(payload.rows, table());
        assert_eq!(payload.selected.len(), 3);
        assert_eq!(payload.pie.len(), 3);
        assert_eq!(payload.flow.links.len(), 1);
        assert_eq!(payload.bars.len(), 4);
        assert_eq!(payload.errors.len(), 1);
        assert_eq!(payload.summary.total_words, 12);
    }

    #[test]
    fn no_word_selects_nothing() {
        let payload = DashboardPayload::build(&table(), &errors(), &DashboardQuery::default());
        assert_eq!(payload.rows, table());
        assert!(payload.selected.is_empty());
        assert!(payload.pie.is_empty());
        assert!(payload.flow.links.is_empty());
        assert!(payload.flow.nodes.is_empty());
        assert!(payload.errors.is_empty());
        assert_eq!(payload.bars.len(), 4);
    }

    #[test]
    fn summary_ignores_filter_and_selection_ignores_filter() {
        let query = DashboardQuery {
            filter: ConfusionFilter {
                categories: vec![Category::Substitutions],
                min_count: Some(3),
                ..ConfusionFilter::default()
            },
            word: Some("cat".into()),
            ..DashboardQuery::default()
        };
        let payload = DashboardPayload::build(&table(), &errors(), &query);
        assert_eq!(payload.rows.len(), 1);
        assert_eq!(payload.rows[0].source, Slot::word("dog"));
        assert_eq!(payload.bars.len(), 1);
        // The whole table: 6 correct + 2 + 3 substituted + 1 deleted.
        assert_eq!(payload.summary.total_words, 12);
        assert_eq!(payload.summary.total_errors, 6);
        assert_eq!(payload.selected.len(), 3);
    }

    #[test]
    fn keyword_views_select_each_keyword_as_reference() {
        let base = DashboardQuery {
            mode: WordMode::Hypothesis,
            ..DashboardQuery::default()
        };
        let keywords = vec!["cat".to_string(), "dog".to_string(), "emu".to_string()];
        let views = keyword_views(&table(), &errors(), &base, &keywords);

        assert_eq!(views.len(), 3);
        assert_eq!(views[0].keyword, "cat");
        assert_eq!(views[0].payload.selected.len(), 3);
        assert_eq!(views[0].payload.errors.len(), 1);
        assert_eq!(views[1].payload.selected.len(), 1);
        assert_eq!(views[1].payload.flow.links.len(), 1);
        assert!(views[2].payload.selected.is_empty());
    }

    #[test]
    fn payload_serializes_with_camel_case() {
        let query = DashboardQuery {
            word: Some("cat".into()),
            ..DashboardQuery::default()
        };
        let payload = DashboardPayload::build(&table(), &errors(), &query);
        let json = serde_json::to_value(&payload).expect("serialize payload");

        assert_eq!(json["summary"]["totalWords"], 12);
        assert!(json["summary"]["wordErrorRate"].is_f64());
        assert_eq!(json["rows"][0]["Source"], "cat");
        assert_eq!(json["selected"][2]["Destination"], "NIL");
        assert_eq!(json["pie"][0]["label"], "Correct");
        assert_eq!(json["flow"]["nodes"][0]["label"], "cat");
        assert_eq!(json["errors"][0]["filename"], "call-2");
        assert_eq!(json["errors"][0]["type"], "substitute");
    }

    #[test]
    fn query_deserializes_from_partial_json() {
        let query: DashboardQuery =
            serde_json::from_str(r#"{"word":"dot","mode":"hypothesis","filter":{"minCount":2}}"#)
                .expect("parse query");
        assert_eq!(query.mode, WordMode::Hypothesis);
        assert_eq!(query.filter.min_count, Some(2));
        assert!(query.filter.categories.is_empty());
        assert!(query.category.is_none());
    }
}
