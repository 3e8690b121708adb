/// Resource page: tab bar, record table, page navigation and overlays

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::core::record::display_value;
use crate::core::{CollectionApi, OverlayState, PageController};
use crate::utils::truncate_string;
use crate::widgets::{centered_rect, tab_bar};

const MAX_CELL_WIDTH: usize = 40;

pub struct ResourceScreen<'a> {
    /// Resource titles, with the active one flagged
    pub tabs: Vec<(String, bool)>,
    pub base_url: &'a str,
    pub show_help: bool,
}

impl<'a> ResourceScreen<'a> {
    pub fn render<A>(&self, frame: &mut Frame, page: &PageController<A>)
    where
        A: CollectionApi + ?Sized + 'static,
    {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tabs
                Constraint::Min(0),    // Table
                Constraint::Length(3), // Page navigation
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        let header = tab_bar(&self.tabs, if self.tabs.len() > 1 { "[ ] to switch" } else { "" }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Catalog Admin | {} ", self.base_url)),
        );
        frame.render_widget(header, chunks[0]);

        self.render_table(frame, chunks[1], page);
        self.render_nav(frame, chunks[2], page);
        self.render_footer(frame, chunks[3], page);

        if page.overlay().is_visible() {
            self.render_form(frame, page);
        } else if page.pending_delete().is_some() {
            self.render_delete_confirm(frame, page);
        }

        if self.show_help {
            self.render_help(frame);
        }
    }

    fn render_table<A>(&self, frame: &mut Frame, area: Rect, page: &PageController<A>)
    where
        A: CollectionApi + ?Sized + 'static,
    {
        let resource = page.resource();
        let table = page.table();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", resource.title));

        let cells = table.rows(resource);
        if cells.is_empty() {
            let (text, color) = if table.is_loading() {
                ("Loading...".to_string(), Color::Yellow)
            } else if let Some(error) = table.last_error() {
                (format!("Could not load records: {}", error), Color::Red)
            } else {
                ("No records".to_string(), Color::DarkGray)
            };
            let placeholder = Paragraph::new(Span::styled(text, Style::default().fg(color)))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(placeholder, area);
            return;
        }

        let headers = resource.headers();
        let widths = column_widths(&headers, &cells);

        let header = Row::new(headers.iter().map(|h| Cell::from(h.to_string())))
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .bottom_margin(1);

        let rows: Vec<Row> = cells
            .into_iter()
            .map(|row| Row::new(row.into_iter().map(|c| Cell::from(truncate_string(&c, MAX_CELL_WIDTH)))))
            .collect();

        // Fresh state per frame; ratatui scrolls the offset to keep the selection visible
        let mut state = TableState::default().with_selected(Some(table.selected_index()));
        let widget = Table::new(rows, widths)
            .header(header)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
        frame.render_stateful_widget(widget, area, &mut state);
    }

    fn render_nav<A>(&self, frame: &mut Frame, area: Rect, page: &PageController<A>)
    where
        A: CollectionApi + ?Sized + 'static,
    {
        let table = page.table();
        let nav = table.nav();
        let enabled = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let disabled = Style::default().fg(Color::DarkGray);

        let mut spans = vec![
            Span::styled("< Prev [p]", if nav.prev_enabled { enabled } else { disabled }),
            Span::raw("   "),
            Span::styled(table.page_label(), Style::default().fg(Color::White)),
            Span::raw("   "),
            Span::styled("[n] Next >", if nav.next_enabled { enabled } else { disabled }),
            Span::raw("   "),
        ];

        if table.is_loading() {
            spans.push(Span::styled("Loading...", Style::default().fg(Color::Yellow)));
        } else if let Some(at) = table.loaded_at() {
            spans.push(Span::styled(
                format!("Updated {}", at.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let widget = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(widget, area);
    }

    fn render_footer<A>(&self, frame: &mut Frame, area: Rect, page: &PageController<A>)
    where
        A: CollectionApi + ?Sized + 'static,
    {
        let (text, style) = match page.status() {
            Some(status) if status.starts_with('✗') => (
                status.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Some(status) => (
                status.to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            None => (
                "[← →] Page | [↑↓] Select | [a]dd | [d]elete | [r]efresh | [?] Help | [q]uit".to_string(),
                Style::default(),
            ),
        };

        let footer = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, area);
    }

    fn render_form<A>(&self, frame: &mut Frame, page: &PageController<A>)
    where
        A: CollectionApi + ?Sized + 'static,
    {
        let overlay = page.overlay();
        let submitting = overlay.state() == OverlayState::Submitting;

        let mut lines = vec![
            Line::from(Span::styled(
                format!("New {}", page.resource().title),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        if overlay.schema().is_empty() {
            lines.push(Line::from(Span::styled(
                "This resource takes no input",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )));
        }

        for (idx, def) in overlay.schema().defs().enumerate() {
            let active = idx == overlay.focus();
            let label_style = if active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let value = overlay.inputs()[idx].as_str();
            let required = if def.required { " *" } else { "" };

            lines.push(Line::from(vec![
                Span::styled(format!("{}{}: ", def.label(), required), label_style),
                Span::styled(
                    if value.is_empty() { "_".to_string() } else { value.to_string() },
                    if active {
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED)
                    } else {
                        Style::default().fg(Color::Gray)
                    },
                ),
            ]));

            if let Some(error) = overlay.field_error(&def.name) {
                lines.push(Line::from(Span::styled(
                    format!("  ✗ {}", error),
                    Style::default().fg(Color::Red),
                )));
            }
        }

        if let Some(banner) = overlay.banner() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("✗ {}", banner),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            if submitting {
                "Submitting..."
            } else {
                "Tab: Next field | Enter: Submit | Esc: Cancel"
            },
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));

        let height = lines.len() as u16 + 2;
        let area = centered_rect(72, height, frame.size());
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(Span::styled(
                        " Create ",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )),
            )
            .wrap(Wrap { trim: true });

        frame.render_widget(Clear, area);
        frame.render_widget(dialog, area);
    }

    fn render_delete_confirm<A>(&self, frame: &mut Frame, page: &PageController<A>)
    where
        A: CollectionApi + ?Sized + 'static,
    {
        let id = page.pending_delete().map(display_value).unwrap_or_default();
        let lines = vec![
            Line::from(Span::styled(
                format!("Delete {} {}?", page.resource().title, id),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "y: Delete | n / Esc: Keep",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )),
        ];

        let area = centered_rect(50, 5, frame.size());
        let dialog = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            );

        frame.render_widget(Clear, area);
        frame.render_widget(dialog, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let section = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled(
                "Catalog Admin - Keyboard Shortcuts",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled("Navigation:", section)),
            Line::from("  [← →] [p n]     Previous / next page"),
            Line::from("  [↑ ↓] [k j]     Select record"),
            Line::from("  [1-9] [ [ ] ]   Switch resource"),
            Line::from("  [r]             Reload current page"),
            Line::from(""),
            Line::from(Span::styled("Records:", section)),
            Line::from("  [a]             Add a record"),
            Line::from("  [d] / [Del]     Delete selected record"),
            Line::from(""),
            Line::from(Span::styled("Form:", section)),
            Line::from("  [Tab] [↑ ↓]     Move between fields"),
            Line::from("  [Enter]         Submit"),
            Line::from("  [Esc]           Cancel"),
            Line::from(""),
            Line::from("  [?] / [F1]      Toggle this help"),
            Line::from("  [q]             Quit"),
        ];

        let area = centered_rect(60, help_text.len() as u16 + 2, frame.size());
        let help = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help "),
        );

        frame.render_widget(Clear, area);
        frame.render_widget(help, area);
    }
}

/// Fit each column to its widest cell; the last column takes the remaining space
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<Constraint> {
    let count = headers.len();
    (0..count)
        .map(|i| {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(headers[i].chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH) as u16
                + 2;
            if i + 1 == count {
                Constraint::Min(widest)
            } else {
                Constraint::Length(widest)
            }
        })
        .collect()
}
