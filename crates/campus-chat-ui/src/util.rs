use ratatui::style::Style;
use ratatui::text::{
    Line,
    Span,
};
use unicode_width::UnicodeWidthChar as _;

/// Truncates `text` to at most `max_chars` characters, appending `...` only when something was
/// cut off.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

fn cells_width(cells: &[(char, Style)]) -> usize {
    cells.iter().map(|(c, _)| c.width().unwrap_or(0)).sum()
}

fn cells_to_line(cells: Vec<(char, Style)>) -> Line<'static> {
    let mut spans = Vec::<Span<'static>>::new();
    let mut content = String::new();
    let mut current_style = None::<Style>;

    for (c, style) in cells {
        if current_style.is_some_and(|s| s != style) {
            spans.push(Span::styled(std::mem::take(&mut content), current_style.unwrap_or_default()));
        }
        current_style = Some(style);
        content.push(c);
    }
    if !content.is_empty() {
        spans.push(Span::styled(content, current_style.unwrap_or_default()));
    }

    Line::from(spans)
}

/// Wraps a styled line into rows of at most `width` columns.
///
/// Rows break after the last space that fits; words longer than a row are split. Styles of the
/// original spans are kept. Always yields at least one row so blank lines keep their height.
pub fn wrap_line(line: &Line<'_>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let cells = line
        .spans
        .iter()
        .flat_map(|span| {
            let style = line.style.patch(span.style);
            span.content.chars().map(move |c| (c, style))
        })
        .collect::<Vec<_>>();

    let mut rows = Vec::<Vec<(char, Style)>>::new();
    let mut row = Vec::<(char, Style)>::new();
    let mut row_width = 0;

    for cell in cells {
        let cell_width = cell.0.width().unwrap_or(0);
        if row_width + cell_width > width && !row.is_empty() {
            // A space at the break point is swallowed
            if cell.0 == ' ' {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
                continue;
            }
            let carry = match row.iter().rposition(|(c, _)| *c == ' ') {
                Some(idx) => row.split_off(idx + 1),
                None => Vec::new(),
            };
            rows.push(std::mem::replace(&mut row, carry));
            row_width = cells_width(&row);

            if row_width + cell_width > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
        }
        row_width += cell_width;
        row.push(cell);
    }
    rows.push(row);

    rows.into_iter().map(cells_to_line).collect()
}

/// Wraps every line in `lines`, see [wrap_line].
pub fn wrap_lines(lines: &[Line<'_>], width: usize) -> Vec<Line<'static>> {
    lines.iter().flat_map(|line| wrap_line(line, width)).collect()
}

#[cfg(test)]
mod tests {
    use ratatui::style::Color;

    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 200), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn test_wrap_breaks_at_spaces() {
        let wrapped = wrap_line(&Line::from("the quick brown fox"), 10);
        assert_eq!(plain(&wrapped), vec!["the quick ", "brown fox"]);

        let wrapped = wrap_line(&Line::from("the quick brown fox"), 9);
        assert_eq!(plain(&wrapped), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let wrapped = wrap_line(&Line::from("abcdefghij"), 4);
        assert_eq!(plain(&wrapped), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_counts_wide_chars() {
        let wrapped = wrap_line(&Line::from("日本語テキスト"), 6);
        assert_eq!(plain(&wrapped), vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn test_wrap_keeps_blank_lines() {
        assert_eq!(wrap_line(&Line::default(), 10).len(), 1);
        assert_eq!(wrap_lines(&[Line::from("a"), Line::default(), Line::from("b")], 10).len(), 3);
    }

    #[test]
    fn test_wrap_keeps_styles() {
        let red = Style::default().fg(Color::Red);
        let line = Line::from(vec![Span::raw("plain "), Span::styled("red words", red)]);
        let wrapped = wrap_line(&line, 8);

        assert_eq!(plain(&wrapped), vec!["plain ", "red ", "words"]);
        assert_eq!(wrapped[1].spans[0].style, red);
        assert_eq!(wrapped[0].spans[0].style, Style::default());
    }
}
