/// Small rendering helpers shared by the screens

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

/// Rect of at most `width` x `height` centered in `area`
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Tab bar with the active tab highlighted
pub fn tab_bar(tabs: &[(String, bool)], hint: &str) -> Paragraph<'static> {
    let mut tab_spans = Vec::new();

    for (i, (tab_name, is_active)) in tabs.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" "));
        }

        if *is_active {
            tab_spans.push(Span::styled(
                format!(" {} {} ", i + 1, tab_name),
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            tab_spans.push(Span::styled(
                format!("[{} {}]", i + 1, tab_name),
                Style::default().fg(Color::Gray),
            ));
        }
    }

    if !hint.is_empty() {
        tab_spans.push(Span::styled(
            format!("  {}", hint),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }

    Paragraph::new(Line::from(tab_spans)).alignment(Alignment::Left)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect(60, 10, area), Rect::new(20, 15, 60, 10));
        assert_eq!(centered_rect(200, 100, area), area);

        let offset = Rect::new(10, 5, 20, 10);
        assert_eq!(centered_rect(10, 4, offset), Rect::new(15, 8, 10, 4));
    }
}
