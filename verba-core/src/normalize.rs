//! Transcript normalization.
//!
//! A raw transcript is a sequence of lines, each optionally prefixed with a
//! one-letter channel tag, followed by leading metadata fields (typically a
//! start and end timestamp) and then the spoken words:
//!
//! ```text
//! L 0.00 1.92 Hello, how are you?
//! R 2.10 3.05 Fine, thanks.
//! 4.00 5.50 untagged lines belong to the mixed channel
//! ```
//!
//! Normalization lower-cases, strips punctuation, drops the metadata fields
//! and joins every line of a channel into one space-separated word string.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Characters removed from transcript content before tokenization.
pub const DEFAULT_PUNCTUATION: &str = ",.!?，。！？";

/// Leading per-line metadata tokens dropped before the words begin.
pub const DEFAULT_METADATA_FIELDS: usize = 2;

/// One of the parallel transcript tracks of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
    /// Mono / mixed track. Also the fallback for untagged lines.
    #[serde(rename = "B")]
    Mixed,
}

impl Channel {
    /// Processing order for every file pair.
    pub const ALL: [Channel; 3] = [Channel::Left, Channel::Right, Channel::Mixed];

    pub fn tag(self) -> &'static str {
        match self {
            Channel::Left => "L",
            Channel::Right => "R",
            Channel::Mixed => "B",
        }
    }

    /// Parse an exact one-letter tag. Anything else is not a tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "L" => Some(Channel::Left),
            "R" => Some(Channel::Right),
            "B" => Some(Channel::Mixed),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
            Channel::Mixed => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Per-channel normalized word strings of one transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelTexts {
    texts: [String; 3],
    /// Lines that carried content but lost all of it to the metadata drop.
    pub short_lines: usize,
}

impl ChannelTexts {
    /// Space-joined normalized words for `channel` (empty when absent).
    pub fn get(&self, channel: Channel) -> &str {
        &self.texts[channel.index()]
    }

    pub fn words(&self, channel: Channel) -> Vec<&str> {
        self.get(channel).split_whitespace().collect()
    }

    pub fn is_blank(&self, channel: Channel) -> bool {
        self.get(channel).trim().is_empty()
    }

    fn push_line(&mut self, channel: Channel, line: &str) {
        let buf = &mut self.texts[channel.index()];
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(line);
    }
}

/// Turns raw transcript text into per-channel word sequences.
#[derive(Debug, Clone)]
pub struct Normalizer {
    punctuation: Vec<char>,
    metadata_fields: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PUNCTUATION, DEFAULT_METADATA_FIELDS)
    }
}

impl Normalizer {
    pub fn new(punctuation: &str, metadata_fields: usize) -> Self {
        Self {
            punctuation: punctuation.chars().collect(),
            metadata_fields,
        }
    }

    pub fn metadata_fields(&self) -> usize {
        self.metadata_fields
    }

    /// Normalize a whole transcript.
    ///
    /// Never fails: empty lines are dropped, unknown tags fall back to
    /// [`Channel::Mixed`], and lines shorter than the metadata prefix
    /// contribute nothing (counted in [`ChannelTexts::short_lines`]).
    pub fn normalize(&self, transcript: &str) -> ChannelTexts {
        let mut out = ChannelTexts::default();

        for line in transcript.lines() {
            let mut tokens = line.split_whitespace();
            let Some(first) = tokens.next() else {
                continue;
            };

            let (channel, content) = match Channel::from_tag(first) {
                Some(channel) => (channel, tokens.collect::<Vec<_>>().join(" ")),
                None => (
                    Channel::Mixed,
                    std::iter::once(first)
                        .chain(tokens)
                        .collect::<Vec<_>>()
                        .join(" "),
                ),
            };

            let cleaned = self.strip_punctuation(&content.to_lowercase());
            let content_tokens = cleaned.split_whitespace().count();
            if content_tokens == 0 {
                continue;
            }
            if content_tokens <= self.metadata_fields {
                out.short_lines += 1;
                debug!(
                    channel = %channel,
                    tokens = content_tokens,
                    "line shorter than metadata prefix, dropped"
                );
                continue;
            }

            let words = cleaned
                .split_whitespace()
                .skip(self.metadata_fields)
                .collect::<Vec<_>>()
                .join(" ");
            out.push_line(channel, &words);
        }

        out
    }

    fn strip_punctuation(&self, text: &str) -> String {
        text.chars()
            .filter(|c| !self.punctuation.contains(c))
            .collect()
    }
}
