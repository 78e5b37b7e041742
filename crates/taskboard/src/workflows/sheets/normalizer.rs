/// Strips byte-order marks and zero-width spaces that spreadsheet exports leak
/// into cell text, then trims surrounding whitespace.
pub(crate) fn clean_cell_text(value: &str) -> String {
    value
        .replace(['\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

/// Spreadsheet letter id for a 0-indexed column: `colA`, ..., `colZ`, `colAA`.
pub(crate) fn column_letter_id(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push(char::from(b'A' + offset as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.reverse();
    format!("col{}", letters.into_iter().collect::<String>())
}
