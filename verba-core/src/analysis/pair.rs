//! Analysis of one reference/hypothesis file pair.

use tracing::debug;

use crate::aggregate::ConfusionCounts;
use crate::align::render::render_alignment;
use crate::align::{align, EditCounts, ErrorMeasures};
use crate::engine::EngineConfig;
use crate::normalize::{Channel, Normalizer};

use super::{ErrorRecord, PaddedView, PairStats};

/// Result for one channel of one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelAnalysis {
    pub stats: PairStats,
    pub measures: ErrorMeasures,
    pub errors: Vec<ErrorRecord>,
    /// Rendered alignment dump, when enabled.
    pub alignment: Option<String>,
}

/// Everything one file pair contributes to a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairAnalysis {
    pub file_id: String,
    /// Analysed channels in `L, R, B` order. Skipped channels are absent.
    pub channels: Vec<ChannelAnalysis>,
    pub confusion: ConfusionCounts,
    pub short_lines: usize,
    pub skipped_channels: usize,
}

impl PairAnalysis {
    pub fn error_count(&self) -> usize {
        self.channels.iter().map(|c| c.errors.len()).sum()
    }
}

/// Stateless per-pair analyzer. Cheap to clone into worker threads.
#[derive(Debug, Clone)]
pub struct PairAnalyzer {
    normalizer: Normalizer,
    context_radius: usize,
    render_alignments: bool,
}

impl Default for PairAnalyzer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl PairAnalyzer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            normalizer: Normalizer::new(&config.punctuation, config.metadata_fields),
            context_radius: config.context_radius,
            render_alignments: config.render_alignments,
        }
    }

    /// Analyse one pair. `None` when either text is blank.
    pub fn analyze(
        &self,
        file_id: &str,
        reference: &str,
        hypothesis: &str,
    ) -> Option<PairAnalysis> {
        if reference.trim().is_empty() || hypothesis.trim().is_empty() {
            debug!(file_id, "blank transcript, pair skipped");
            return None;
        }

        let ref_texts = self.normalizer.normalize(reference);
        let hyp_texts = self.normalizer.normalize(hypothesis);
        let mut out = PairAnalysis {
            file_id: file_id.to_string(),
            short_lines: ref_texts.short_lines + hyp_texts.short_lines,
            ..PairAnalysis::default()
        };

        for channel in Channel::ALL {
            if ref_texts.is_blank(channel) || hyp_texts.is_blank(channel) {
                out.skipped_channels += 1;
                debug!(file_id, channel = %channel, "channel empty on one side, skipped");
                continue;
            }

            let ref_words = ref_texts.words(channel);
            let hyp_words = hyp_texts.words(channel);
            let chunks = align(&ref_words, &hyp_words);
            let counts = EditCounts::from_chunks(&chunks);

            let errors = PaddedView::build(&ref_words, &hyp_words, &chunks).extract_errors(
                file_id,
                channel,
                self.context_radius,
            );
            let alignment = self
                .render_alignments
                .then(|| render_alignment(&ref_words, &hyp_words, &chunks));
            out.confusion.record_alignment(&ref_words, &hyp_words, &chunks);

            out.channels.push(ChannelAnalysis {
                stats: PairStats::from_counts(file_id, channel, counts),
                measures: counts.measures(),
                errors,
                alignment,
            });
        }

        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Category;
    use crate::align::ChunkKind;
    use approx::assert_relative_eq;

    fn analyzer() -> PairAnalyzer {
        PairAnalyzer::default()
    }

    #[test]
    fn blank_text_skips_pair() {
        assert!(analyzer().analyze("f", "   \n", "B 0 1 hello").is_none());
        assert!(analyzer().analyze("f", "B 0 1 hello", "").is_none());
    }

    #[test]
    fn stereo_pair_yields_one_row_per_channel_in_order() {
        let reference = "L 0 1 hello there\nR 0 1 good morning";
        let hypothesis = "L 0 1 hello there\nR 0 1 good evening";
        let analysis = analyzer().analyze("call", reference, hypothesis).expect("analysed");

        let channels: Vec<Channel> = analysis.channels.iter().map(|c| c.stats.channel).collect();
        assert_eq!(channels, vec![Channel::Left, Channel::Right]);
        assert_eq!(analysis.skipped_channels, 1);

        let right = &analysis.channels[1];
        assert_relative_eq!(right.stats.word_error_rate, 0.5);
        assert_eq!(right.errors.len(), 1);
        assert_eq!(right.errors[0].error_type, ChunkKind::Substitute);
        assert_eq!(right.errors[0].ref_word, "morning");
        assert_eq!(right.errors[0].hyp_word, "evening");
    }

    #[test]
    fn channel_empty_on_one_side_is_skipped() {
        // Reference has no mixed-channel words; hypothesis does.
        let analysis = analyzer()
            .analyze("f", "L 0 1 left words", "L 0 1 left words\nB 0 1 hello")
            .expect("analysed");
        assert_eq!(analysis.channels.len(), 1);
        assert_eq!(analysis.channels[0].stats.channel, Channel::Left);
        assert_eq!(analysis.error_count(), 0);
    }

    #[test]
    fn metadata_drop_feeds_short_lines_counter() {
        let analysis = analyzer()
            .analyze("f", "B the cat sat", "B the sat")
            .expect("texts are not blank");
        assert!(analysis.channels.is_empty());
        assert_eq!(analysis.short_lines, 1);
        assert_eq!(analysis.skipped_channels, 3);
        assert!(analysis.confusion.is_empty());
    }

    #[test]
    fn confusion_counts_cover_every_position() {
        let analysis = analyzer()
            .analyze("f", "0 1 a b c d", "0 1 a x d e")
            .expect("analysed");
        let totals = analysis.confusion.totals();
        assert_eq!(totals.reference_len(), 4);
        assert_eq!(totals.hypothesis_len(), 4);

        let stats = &analysis.channels[0].stats;
        assert_eq!(stats.counts(), totals);
        assert!(analysis
            .confusion
            .entries()
            .iter()
            .any(|e| e.category == Category::Substitutions));
    }

    #[test]
    fn alignment_dump_can_be_disabled() {
        let config = EngineConfig {
            render_alignments: false,
            ..EngineConfig::default()
        };
        let analysis = PairAnalyzer::new(&config)
            .analyze("f", "0 1 one two", "0 1 one too")
            .expect("analysed");
        assert!(analysis.channels[0].alignment.is_none());

        let analysis = analyzer().analyze("f", "0 1 one two", "0 1 one too").expect("analysed");
        let dump = analysis.channels[0].alignment.as_deref().unwrap_or_default();
        assert!(dump.contains("REF: one two"), "{dump}");
    }

    #[test]
    fn context_radius_comes_from_config() {
        let config = EngineConfig {
            context_radius: 1,
            ..EngineConfig::default()
        };
        let analysis = PairAnalyzer::new(&config)
            .analyze("f", "0 1 a b c d e", "0 1 a b x d e")
            .expect("analysed");
        let error = &analysis.channels[0].errors[0];
        assert_eq!(error.ref_context_before, "b");
        assert_eq!(error.ref_context_after, "d");
    }
}
