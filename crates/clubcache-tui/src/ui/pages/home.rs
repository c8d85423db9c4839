use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::truncate_string;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_officers(frame, app, chunks[0]);
    render_about(frame, app, chunks[1]);
}

fn render_officers(frame: &mut Frame, app: &App, area: Rect) {
    let officers = &app.content.data.officers;
    let block = Block::default()
        .title(format!(" Officers ({}) ", officers.len()))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if officers.is_empty() {
        let message = if app.content.initial_loading {
            "Loading officers..."
        } else {
            "No officers listed yet."
        };
        let paragraph = Paragraph::new(Span::styled(message, styles::muted_style())).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([Cell::from("Name"), Cell::from("Role"), Cell::from("Year")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = officers
        .iter()
        .enumerate()
        .map(|(i, officer)| {
            let style = if i == app.officer_selection {
                styles::selected_style()
            } else if app.is_changed(&officer.id()) {
                styles::changed_style()
            } else {
                styles::list_item_style()
            };
            let name = if officer.flag.is_empty() {
                officer.name.clone()
            } else {
                format!("{} {}", officer.flag, officer.name)
            };
            Row::new(vec![
                Cell::from(name),
                Cell::from(officer.role.as_str()),
                Cell::from(officer.year.as_str()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(45),
        Constraint::Fill(1),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.officer_selection));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_about(frame: &mut Frame, app: &App, area: Rect) {
    let site = &app.content.data.site;
    let mut lines = vec![
        Line::from(Span::styled(site.title.as_str(), styles::title_style())),
        Line::from(Span::styled(site.tagline.as_str(), styles::highlight_style())),
        Line::from(""),
        Line::from(site.about.as_str()),
        Line::from(""),
        Line::from(Span::styled("Important links", styles::highlight_style())),
    ];

    let width = area.width.saturating_sub(6) as usize;
    for link in &app.content.data.links {
        let style = if app.is_changed(&link.id()) {
            styles::changed_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled("• ", styles::muted_style()),
            Span::styled(link.title.as_str(), style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {}", truncate_string(&link.url, width)),
            styles::muted_style(),
        )));
        if let Some(ref description) = link.description {
            lines.push(Line::from(format!("  {}", description)));
        }
    }

    if let Some(ref email) = site.contact_email {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Contact: ", styles::muted_style()),
            Span::raw(email.as_str()),
        ]));
    }

    let block = Block::default()
        .title(" About ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
