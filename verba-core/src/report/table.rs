//! CSV encoding and decoding of the exported tables.
//!
//! Headers are always written, so an empty batch still produces a valid,
//! re-loadable table. Cells are written verbatim; the right-aligned padding
//! inside `errors_context` words survives a round trip.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::aggregate::{Category, ConfusionEntry};
use crate::align::ChunkKind;
use crate::analysis::{ErrorRecord, PairStats};
use crate::error::{Result, VerbaError};

pub const STATS_HEADERS: [&str; 7] = [
    "id",
    "prefix",
    "wer",
    "correct",
    "substitutions",
    "insertions",
    "deletions",
];

pub const WORD_ERRORS_HEADERS: [&str; 4] = ["Source", "Destination", "Count", "Category"];

pub const ERRORS_CONTEXT_HEADERS: [&str; 9] = [
    "filename", "prefix", "ref_prev", "ref", "ref_post", "hyp_prev", "hyp", "hyp_post", "type",
];

pub fn write_stats<W: Write>(out: W, rows: &[PairStats]) -> Result<()> {
    write_table(out, &STATS_HEADERS, rows)
}

pub fn write_word_errors<W: Write>(out: W, rows: &[ConfusionEntry]) -> Result<()> {
    write_table(out, &WORD_ERRORS_HEADERS, rows)
}

pub fn write_errors_context<W: Write>(out: W, rows: &[ErrorRecord]) -> Result<()> {
    write_table(out, &ERRORS_CONTEXT_HEADERS, rows)
}

pub fn read_stats<R: Read>(input: R) -> Result<Vec<PairStats>> {
    read_table(input, |_| Ok(()))
}

/// Decode a `word_errors` table. `NIL` cells decode to [`Slot::Absent`].
///
/// Rows whose category contradicts their NIL placement are rejected.
///
/// [`Slot::Absent`]: crate::aggregate::Slot::Absent
pub fn read_word_errors<R: Read>(input: R) -> Result<Vec<ConfusionEntry>> {
    read_table(input, |entry: &ConfusionEntry| {
        let consistent = match entry.category {
            Category::Correct => entry.source == entry.destination && !entry.source.is_absent(),
            Category::Substitutions => !entry.source.is_absent() && !entry.destination.is_absent(),
            Category::Deletions => !entry.source.is_absent() && entry.destination.is_absent(),
            Category::Insertions => entry.source.is_absent() && !entry.destination.is_absent(),
        };
        if consistent {
            Ok(())
        } else {
            Err(format!(
                "{} row {} -> {} has the wrong NIL placement",
                entry.category, entry.source, entry.destination
            ))
        }
    })
}

pub fn read_errors_context<R: Read>(input: R) -> Result<Vec<ErrorRecord>> {
    read_table(input, |record: &ErrorRecord| {
        if record.error_type == ChunkKind::Equal {
            Err("errors_context row of type equal".to_string())
        } else {
            Ok(())
        }
    })
}

fn write_table<W: Write, T: Serialize>(out: W, headers: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_table<R, T, F>(input: R, check: F) -> Result<Vec<T>>
where
    R: Read,
    T: DeserializeOwned,
    F: Fn(&T) -> std::result::Result<(), String>,
{
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: T = record
            .deserialize(Some(&headers))
            .map_err(|e| VerbaError::invalid_row(line, e.to_string()))?;
        check(&row).map_err(|message| VerbaError::invalid_row(line, message))?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Slot;
    use crate::normalize::Channel;

    fn encode(write: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        write(&mut buf).expect("encode table");
        String::from_utf8(buf).expect("utf-8 csv")
    }

    #[test]
    fn empty_tables_still_carry_headers() {
        let text = encode(|b| write_word_errors(b, &[]));
        assert_eq!(text, "Source,Destination,Count,Category\n");
        assert!(read_word_errors(text.as_bytes()).expect("decode").is_empty());

        let text = encode(|b| write_stats(b, &[]));
        assert_eq!(text, "id,prefix,wer,correct,substitutions,insertions,deletions\n");
    }

    #[test]
    fn nil_written_literally_and_decoded_as_absent() {
        let rows = vec![ConfusionEntry {
            source: Slot::word("cat"),
            destination: Slot::Absent,
            count: 3,
            category: Category::Deletions,
        }];
        let text = encode(|b| write_word_errors(b, &rows));
        assert!(text.ends_with("cat,NIL,3,Deletions\n"), "{text}");
        assert_eq!(read_word_errors(text.as_bytes()).expect("decode"), rows);
    }

    #[test]
    fn stats_columns_in_order() {
        let rows = vec![PairStats {
            file_id: "a/b".into(),
            channel: Channel::Right,
            word_error_rate: 0.25,
            correct_count: 3,
            substitution_count: 1,
            insertion_count: 0,
            deletion_count: 0,
        }];
        let text = encode(|b| write_stats(b, &rows));
        assert!(text.ends_with("a/b,R,0.25,3,1,0,0\n"), "{text}");
        assert_eq!(read_stats(text.as_bytes()).expect("decode"), rows);
    }

    #[test]
    fn padded_words_survive_round_trip() {
        let rows = vec![ErrorRecord {
            file_id: "f".into(),
            channel: Channel::Mixed,
            ref_context_before: String::new(),
            ref_word: "four".into(),
            ref_context_after: "five, six".into(),
            hyp_context_before: String::new(),
            hyp_word: " for".into(),
            hyp_context_after: "five, six".into(),
            error_type: ChunkKind::Substitute,
        }];
        let text = encode(|b| write_errors_context(b, &rows));
        assert_eq!(read_errors_context(text.as_bytes()).expect("decode"), rows);
    }

    #[test]
    fn inconsistent_category_is_rejected_with_line() {
        let text = "Source,Destination,Count,Category\ncat,dog,1,Correct\n";
        match read_word_errors(text.as_bytes()) {
            Err(VerbaError::InvalidRow { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected InvalidRow, got {other:?}"),
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        let text = "Source,Destination,Count,Category\ncat,dog,1,Typos\n";
        assert!(matches!(
            read_word_errors(text.as_bytes()),
            Err(VerbaError::InvalidRow { .. })
        ));
    }
}
