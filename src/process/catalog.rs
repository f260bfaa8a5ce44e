use serde::Serialize;

use super::table::ParsedTable;

/// Everything parsed out of one export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    /// Tables keyed `0..n` in the order they appear in the document.
    pub tables: Vec<(usize, ParsedTable)>,
    /// Narrative blocks, line breaks folded.
    pub narrative: Vec<String>,
    /// Narrative text followed by one `idx : title (RxC)` line per table.
    pub description: String,
}

impl Dataset {
    pub fn get(&self, key: usize) -> Option<&ParsedTable> {
        self.tables.get(key).map(|(_, t)| t)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ParsedTable)> {
        self.tables.iter().map(|(i, t)| (*i, t))
    }

    pub fn find(&self, title: &str) -> Option<&ParsedTable> {
        self.iter().map(|(_, t)| t).find(|t| t.title == title)
    }
}

/// Number the tables and build the description.
pub fn assemble(narrative: Vec<String>, tables: Vec<ParsedTable>) -> Dataset {
    let header = if narrative.is_empty() {
        String::new()
    } else {
        format!("{}\n\n", narrative.join(" ").replace("  ", " "))
    };
    let catalog = tables
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{:>3} : {}", i, t.descriptor()))
        .collect::<Vec<_>>()
        .join("\n");

    Dataset {
        tables: tables.into_iter().enumerate().collect(),
        narrative,
        description: header + &catalog,
    }
}
