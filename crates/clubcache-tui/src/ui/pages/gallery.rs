use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::render::image_lines;
use crate::ui::styles;
use crate::utils::plural;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_gallery_list(frame, app, chunks[0]);
    render_gallery_detail(frame, app, chunks[1]);
}

fn render_gallery_list(frame: &mut Frame, app: &App, area: Rect) {
    let galleries = &app.content.data.galleries;

    let header = Row::new([Cell::from("Event"), Cell::from("Date"), Cell::from("Photos")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = galleries
        .iter()
        .enumerate()
        .map(|(i, gallery)| {
            let style = if i == app.gallery_selection {
                styles::selected_style()
            } else if app.is_changed(&gallery.record_id()) {
                styles::changed_style()
            } else {
                styles::list_item_style()
            };
            let date = if gallery.date.is_empty() { "-" } else { gallery.date.as_str() };
            Row::new(vec![
                Cell::from(gallery.title.as_str()),
                Cell::from(date),
                Cell::from(gallery.image_count.to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(12),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" Galleries ({}) - [Enter] open ", galleries.len()))
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.gallery_selection));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_gallery_detail(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_gallery() {
        Some(gallery) => {
            let mut lines = vec![
                Line::from(Span::styled(gallery.title.as_str(), styles::title_style())),
                Line::from(Span::styled(
                    plural(gallery.image_count, "photo"),
                    styles::muted_style(),
                )),
                Line::from(""),
            ];
            if !gallery.description.is_empty() {
                lines.push(Line::from(gallery.description.as_str()));
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled("Cover", styles::highlight_style())));
            lines.extend(image_lines(&gallery.cover, 0));
            lines
        }
        None => vec![Line::from(Span::styled(
            "No galleries yet.",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
