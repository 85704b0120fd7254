pub mod date_input;

use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Spans,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Index after `current` in a list of `len`, wrapping to the top.
pub fn next_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(i) if i + 1 < len => i + 1,
        _ => 0,
    })
}

/// Index before `current` in a list of `len`, wrapping to the bottom.
pub fn previous_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(0) | None => len - 1,
        Some(i) => i - 1,
    })
}

/// Highlight for the field the cursor is on.
pub fn field_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

/// Key hints, plus an error line when one is pending.
pub fn render_help<B: Backend>(frame: &mut Frame<B>, area: Rect, help: &str, error: Option<&str>) {
    let mut lines = vec![Spans::from(help.to_string())];
    if let Some(error) = error {
        lines.push(Spans::from(tui::text::Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    let help = Paragraph::new(lines)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, area);
}

pub fn render_confirmation<B: Backend>(frame: &mut Frame<B>, title: &str, lines: Vec<Spans>) {
    let popup_area = centered_rect(50, 25, frame.size());
    let popup = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_wraps_both_ways() {
        assert_eq!(next_index(Some(2), 3), Some(0));
        assert_eq!(next_index(None, 3), Some(0));
        assert_eq!(previous_index(Some(0), 3), Some(2));
        assert_eq!(previous_index(Some(1), 3), Some(0));
        assert_eq!(next_index(Some(0), 0), None);
    }
}
