//! Splitting an export into blank-line separated blocks and telling prose
//! apart from data.

use super::date_parser::parse_index_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Narrative,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub kind: BlockKind,
    /// The block exactly as it appeared in the document.
    pub raw: &'a str,
}

impl Block<'_> {
    /// Narrative text with line breaks folded into spaces.
    pub fn normalized(&self) -> String {
        normalize(self.raw)
    }
}

/// Split `doc` on blank lines, keeping document order. Whitespace-only pieces
/// are dropped.
pub fn segment(doc: &str) -> Vec<&str> {
    doc.split("\n\n")
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}

pub fn normalize(chunk: &str) -> String {
    chunk.replace("\r\n", " ").trim().to_string()
}

/// True when alphabetic characters strictly outnumber numeric ones.
pub fn is_mostly_alphabetic(chunk: &str) -> bool {
    let cleaned = normalize(chunk);
    let (alpha, numeric) = cleaned.chars().fold((0usize, 0usize), |(a, n), c| {
        if c.is_alphabetic() {
            (a + 1, n)
        } else if c.is_numeric() {
            (a, n + 1)
        } else {
            (a, n)
        }
    });
    alpha > numeric
}

/// A title line followed by comma-separated lines that all carry the same
/// number of fields, at least one of them keyed by a date. Small tables with
/// wordy headers can have more letters than digits.
pub fn looks_tabular(chunk: &str) -> bool {
    let mut lines = chunk
        .trim_start_matches(['\r', '\n'])
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .peekable();
    let Some(first) = lines.peek() else {
        return false;
    };
    let width = first.split(',').count();
    if width < 2 {
        return false;
    }
    let mut rows = 0;
    let mut dated = false;
    for line in lines {
        if line.split(',').count() != width {
            return false;
        }
        rows += 1;
        let key = line.split(',').next().unwrap_or_default();
        dated |= parse_index_token(key).is_resolved();
    }
    rows >= 2 && dated
}

/// Narrative when shorter than `narrative_max_len`, mostly alphabetic and not
/// [`looks_tabular`]; the last condition lets small wordy tables through as
/// `Table` even when letters outnumber digits.
pub fn classify(chunk: &str, narrative_max_len: usize) -> BlockKind {
    if is_mostly_alphabetic(chunk)
        && chunk.chars().count() < narrative_max_len
        && !looks_tabular(chunk)
    {
        BlockKind::Narrative
    } else {
        BlockKind::Table
    }
}

pub fn classify_blocks(doc: &str, narrative_max_len: usize) -> Vec<Block<'_>> {
    segment(doc)
        .into_iter()
        .map(|raw| Block {
            kind: classify(raw, narrative_max_len),
            raw,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_NARRATIVE_MAX_LEN;

    #[test]
    fn empty_document_has_no_blocks() {
        assert!(segment("").is_empty());
        assert!(segment("\n\n\n\n").is_empty());
    }

    #[test]
    fn segments_keep_order_and_content() {
        let doc = "first\r\nline\n\nsecond\n\n\nthird\n\n";
        assert_eq!(segment(doc), vec!["first\r\nline", "second", "\nthird"]);
    }

    #[test]
    fn normalize_folds_crlf() {
        assert_eq!(normalize("  This file\r\nwas created  "), "This file was created");
    }

    #[test]
    fn short_prose_is_narrative() {
        let text = "This file was created using the 2023 database.";
        assert_eq!(classify(text, DEFAULT_NARRATIVE_MAX_LEN), BlockKind::Narrative);
    }

    #[test]
    fn tie_is_table() {
        // four letters, four digits
        assert_eq!(classify("ab12 cd34", DEFAULT_NARRATIVE_MAX_LEN), BlockKind::Table);
    }

    #[test]
    fn numeric_heavy_block_is_table() {
        let text = "Annual\nDate,MF\n2019,1.23\n2020,4.56";
        assert_eq!(classify(text, DEFAULT_NARRATIVE_MAX_LEN), BlockKind::Table);
    }

    #[test]
    fn long_prose_is_table() {
        let text = "word ".repeat(320);
        assert_eq!(text.chars().count(), 1600);
        assert!(is_mostly_alphabetic(&text));
        assert_eq!(classify(&text, DEFAULT_NARRATIVE_MAX_LEN), BlockKind::Table);
        assert_eq!(classify(&text[..1599], DEFAULT_NARRATIVE_MAX_LEN), BlockKind::Narrative);
    }

    #[test]
    fn limit_counts_unnormalized_length() {
        // normalized text is shorter than the limit, the raw block is not
        let text = format!("{}notes", " ".repeat(20));
        assert_eq!(classify(&text, 25), BlockKind::Table);
        assert_eq!(classify(&text, 26), BlockKind::Narrative);
    }

    #[test]
    fn small_wordy_table_is_table() {
        // 11 letters against 10 digits
        let text = "Title A\nDate,X\n2020,1\n2021,2";
        assert!(is_mostly_alphabetic(text));
        assert!(looks_tabular(text));
        assert_eq!(classify(text, DEFAULT_NARRATIVE_MAX_LEN), BlockKind::Table);
    }

    #[test]
    fn prose_with_commas_is_not_tabular() {
        let text = "Notes\nReturns are value weighted, in percent,\nand exclude financials, utilities,";
        assert!(!looks_tabular(text));
        assert_eq!(classify(text, DEFAULT_NARRATIVE_MAX_LEN), BlockKind::Narrative);
    }

    #[test]
    fn blocks_are_tagged_in_order() {
        let doc = "Some notes here.\n\nTitle A\nDate,X\n2020,1\n2021,2";
        let blocks = classify_blocks(doc, DEFAULT_NARRATIVE_MAX_LEN);
        let kinds: Vec<_> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BlockKind::Narrative, BlockKind::Table]);
        assert_eq!(blocks[0].normalized(), "Some notes here.");
    }
}
