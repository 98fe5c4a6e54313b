use std::borrow::Cow;
use std::fmt::Write as _;

const MIN_COLUMN_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Left,
    Right,
}

/// Renders an aligned plain-text table.
///
/// Columns holding only numbers (blank cells allowed) are right-aligned so
/// scores and totals line up; everything else is left-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    let mut saw_number = vec![false; column_count];
    let mut all_numeric = vec![true; column_count];

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.parse::<f64>().is_ok() {
                saw_number[idx] = true;
            } else {
                all_numeric[idx] = false;
            }
        }
    }

    for width in &mut widths {
        *width = (*width).max(MIN_COLUMN_WIDTH);
    }
    let alignments = saw_number
        .iter()
        .zip(&all_numeric)
        .map(|(saw, all)| {
            if *saw && *all {
                Alignment::Right
            } else {
                Alignment::Left
            }
        })
        .collect::<Vec<_>>();

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &alignments));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &alignments));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &alignments));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize], alignments: &[Alignment]) -> String {
    let mut cells = Vec::with_capacity(widths.len());
    for (idx, width) in widths.iter().enumerate() {
        let sanitized = values
            .get(idx)
            .map(|value| sanitize_cell(value))
            .unwrap_or(Cow::Borrowed(""));
        let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
        let cell = match alignments[idx] {
            Alignment::Left => format!("{sanitized}{padding}"),
            Alignment::Right => format!("{padding}{sanitized}"),
        };
        cells.push(cell);
    }
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape sequence, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
