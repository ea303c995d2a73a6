//! Fixed-column markdown table rendering and cell escaping.

use unicode_width::UnicodeWidthStr;

/// Column alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Escape a free-text cell so it survives a markdown table row.
pub fn escape_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a path; `>` is escaped too so ` -> ` is unambiguous.
///
/// Leading and trailing spaces become `\s` since cells are trimmed.
pub fn escape_path(path: &str) -> String {
    let escaped = escape_cell(path).replace('>', "\\>");
    let body = escaped.trim_matches(' ');
    let leading = escaped.len() - escaped.trim_start_matches(' ').len();
    let trailing = if body.is_empty() {
        0
    } else {
        escaped.len() - escaped.trim_end_matches(' ').len()
    };
    format!("{}{}{}", "\\s".repeat(leading), body, "\\s".repeat(trailing))
}

/// Inverse of [`escape_cell`] / [`escape_path`]. Unknown escapes are kept.
pub fn unescape(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut chars = cell.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('|') => out.push('|'),
            Some('>') => out.push('>'),
            Some('n') => out.push('\n'),
            Some('s') => out.push(' '),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split a table row into its still-escaped, trimmed cells.
///
/// Returns `None` when the line is not a table row. The trailing pipe is
/// optional.
pub fn split_row(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    let rest = line.strip_prefix('|')?;

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }

    Some(cells)
}

/// Whether a cell is a header separator such as `---`, `:--` or `--:`.
pub fn is_separator_cell(cell: &str) -> bool {
    let inner = cell.trim().trim_start_matches(':').trim_end_matches(':');
    !inner.is_empty() && inner.chars().all(|c| c == '-')
}

/// Render an aligned table; widths follow the widest cell in each column.
pub fn render(headers: &[&str], aligns: &[Align], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(*h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut lines = vec![format_row(&header_cells, &widths, aligns)];

    let separator: Vec<String> = widths
        .iter()
        .zip(aligns)
        .map(|(w, align)| match align {
            Align::Left => "-".repeat(w + 2),
            Align::Right => format!("{}:", "-".repeat(w + 1)),
        })
        .collect();
    lines.push(format!("|{}|", separator.join("|")));

    for row in rows {
        lines.push(format_row(row, &widths, aligns));
    }

    lines.join("\n")
}

/// Pad `text` to `target` terminal columns.
fn pad_to_width(text: &str, target: usize, align: Align) -> String {
    let deficit = target.saturating_sub(UnicodeWidthStr::width(text));
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(deficit)),
        Align::Right => format!("{}{}", " ".repeat(deficit), text),
    }
}

fn format_row(cells: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let formatted: Vec<String> = cells
        .iter()
        .zip(widths)
        .zip(aligns)
        .map(|((cell, &w), &align)| format!(" {} ", pad_to_width(cell, w, align)))
        .collect();
    format!("|{}|", formatted.join("|"))
}
