//! A1-notation helpers shared by the store implementations.

/// A rectangular A1 range such as `A2:G`, `B3` or `A2:B10`.
/// Columns and rows are 1-based; `None` bounds are open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A1Range {
    pub first_col: usize,
    pub first_row: usize,
    pub last_col: Option<usize>,
    pub last_row: Option<usize>,
}

impl A1Range {
    pub fn parse(s: &str) -> Option<Self> {
        let (from, to) = match s.split_once(':') {
            Some((a, b)) => (a, Some(b)),
            None => (s, None),
        };
        let (first_col, first_row) = parse_cell(from)?;
        let first_col = first_col?;
        let first_row = first_row.unwrap_or(1);
        let (last_col, last_row) = match to {
            Some(to) => parse_cell(to)?,
            // A single cell is a 1x1 range.
            None => (Some(first_col), Some(first_row)),
        };
        if last_col.is_some_and(|c| c < first_col) || last_row.is_some_and(|r| r < first_row) {
            return None;
        }
        Some(Self {
            first_col,
            first_row,
            last_col,
            last_row,
        })
    }
}

/// Split `AB12` into (column 28, row 12). Either half may be absent.
fn parse_cell(s: &str) -> Option<(Option<usize>, Option<usize>)> {
    let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
    let (letters, digits) = s.split_at(split);
    if letters.is_empty() && digits.is_empty() {
        return None;
    }
    let col = if letters.is_empty() {
        None
    } else {
        Some(column_index(letters)?)
    };
    let row = if digits.is_empty() {
        None
    } else {
        let row: usize = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(row)
    };
    Some((col, row))
}

/// `A` → 1, `Z` → 26, `AA` → 27.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    letters.bytes().try_fold(0usize, |acc, b| {
        acc.checked_mul(26)?
            .checked_add((b.to_ascii_uppercase() - b'A') as usize + 1)
    })
}

/// 1 → `A`, 27 → `AA`.
pub fn column_letters(mut col: usize) -> String {
    let mut out = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        out.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

pub fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{row}", column_letters(col))
}
