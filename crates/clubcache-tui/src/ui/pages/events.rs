use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::format_optional;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_event_list(frame, app, chunks[0]);
    render_event_detail(frame, app, chunks[1]);
}

fn render_event_list(frame: &mut Frame, app: &App, area: Rect) {
    let title = match (&app.events_age, app.events_loading) {
        (_, true) => format!(" Upcoming events ({}) - loading... ", app.events.len()),
        (Some(age), false) => format!(" Upcoming events ({}) - updated {} ", app.events.len(), age),
        (None, false) => format!(" Upcoming events ({}) ", app.events.len()),
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.events.is_empty() {
        let (message, style) = match (&app.events_error, app.events_loading) {
            (Some(error), _) => (error.clone(), styles::error_style()),
            (None, true) => ("Loading events...".to_string(), styles::muted_style()),
            (None, false) => ("No upcoming events.".to_string(), styles::muted_style()),
        };
        let paragraph = Paragraph::new(Span::styled(message, style))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([
        Cell::from("Date"),
        Cell::from("Time"),
        Cell::from("Event"),
        Cell::from("Location"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let style = if i == app.event_selection {
                styles::selected_style()
            } else if event.is_cancelled() {
                styles::muted_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(event.formatted_date()),
                Cell::from(event.formatted_time()),
                Cell::from(event.title.as_str()),
                Cell::from(format_optional(&event.location, "-")),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(13),
        Constraint::Length(20),
        Constraint::Fill(1),
        Constraint::Percentage(25),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.event_selection));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_event_detail(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_event() {
        Some(event) => {
            let status_style = if event.is_cancelled() {
                styles::error_style()
            } else {
                styles::success_style()
            };
            let mut lines = vec![
                Line::from(Span::styled(event.title.as_str(), styles::title_style())),
                Line::from(""),
                Line::from(vec![
                    Span::styled("When:      ", styles::muted_style()),
                    Span::raw(format!("{}, {}", event.formatted_date(), event.formatted_time())),
                ]),
                Line::from(vec![
                    Span::styled("Where:     ", styles::muted_style()),
                    Span::raw(format_optional(&event.location, "TBA")),
                ]),
                Line::from(vec![
                    Span::styled("Status:    ", styles::muted_style()),
                    Span::styled(event.status.to_string(), status_style),
                ]),
            ];
            if let Some(ref organizer) = event.organizer {
                lines.push(Line::from(vec![
                    Span::styled("Organizer: ", styles::muted_style()),
                    Span::raw(organizer.as_str()),
                ]));
            }
            if let Some(ref link) = event.link {
                lines.push(Line::from(vec![
                    Span::styled("Link:      ", styles::muted_style()),
                    Span::raw(link.as_str()),
                ]));
            }
            if let Some(ref description) = event.description {
                lines.push(Line::from(""));
                lines.push(Line::from(description.as_str()));
            }
            if let Some(ref error) = app.events_error {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("Showing saved events: {}", error),
                    styles::error_style(),
                )));
            }
            lines
        }
        None => vec![],
    };

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
