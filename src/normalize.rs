/// Fold user-entered text to plain ASCII digits and punctuation.
///
/// Full-width forms (U+FF01..U+FF5E) map to their ASCII counterparts, the dash
/// family (hyphens, en/em dashes, minus, the katakana prolonged sound mark)
/// becomes `-`, and every whitespace character is removed. Page specs and
/// identifier scans both run on the folded text.
pub fn to_half_width(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .map(fold_char)
        .collect()
}

fn fold_char(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{30FC}' | '\u{FF70}' => '-',
        _ => c,
    }
}
