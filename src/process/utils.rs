use super::table::Cell;

const NA_VALUES: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A"];

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn is_missing(cleaned: &str) -> bool {
    NA_VALUES.contains(&cleaned)
}

/// Infer a typed cell from a raw field.
pub fn parse_cell(raw: &str) -> Cell {
    let s = clean_str(raw);
    if is_missing(&s) {
        Cell::Missing
    } else if let Ok(v) = s.parse::<f64>() {
        Cell::Number(v)
    } else {
        Cell::Text(s)
    }
}

/// Make labels unique by suffixing repeats with `.1`, `.2`, ...
pub fn dedupe_labels(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let mut candidate = label.clone();
        let mut n = 0;
        while out.contains(&candidate) {
            n += 1;
            candidate = format!("{}.{}", label, n);
        }
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_typed() {
        assert_eq!(parse_cell("  1.25 "), Cell::Number(1.25));
        assert_eq!(parse_cell("-99.99"), Cell::Number(-99.99));
        assert_eq!(parse_cell(" "), Cell::Missing);
        assert_eq!(parse_cell("NA"), Cell::Missing);
        assert_eq!(parse_cell("\"Large\""), Cell::Text("Large".into()));
    }

    #[test]
    fn repeated_labels_get_suffixes() {
        let labels = vec!["X".into(), "Y".into(), "X".into(), "X".into()];
        assert_eq!(dedupe_labels(labels), vec!["X", "Y", "X.1", "X.2"]);
    }
}
