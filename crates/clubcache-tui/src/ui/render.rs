use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use clubcache_core::cache::age_display;
use clubcache_core::images::ImageRef;
use clubcache_core::navigation::{Modal, Page};
use clubcache_core::RefreshState;

use crate::app::{App, AppState};
use crate::utils::plural;

use super::pages::{events, gallery, history, home};
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let notice_height = if app.content.error.is_some() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Title bar
            Constraint::Length(3),             // Pages
            Constraint::Length(notice_height), // Error notice
            Constraint::Min(10),               // Main content
            Constraint::Length(2),             // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_pages(frame, app, chunks[1]);
    render_notice(frame, app, chunks[2]);
    render_main_content(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    match &app.nav.modal {
        Some(Modal::Officer(name)) => render_officer_modal(frame, app, name),
        Some(Modal::Gallery(id)) => render_gallery_modal(frame, app, id),
        None => {}
    }

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_confirm_overlay(frame, "Are you sure you want to quit?"),
        AppState::ConfirmingClearCache => {
            render_confirm_overlay(frame, "Clear cached content and reload?")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let site = &app.content.data.site;
    let title = format!("  {}", site.title);
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::styled(format!("  {}", site.tagline), styles::muted_style()),
    ]);
    let used = title.chars().count() + site.tagline.chars().count() + 2;
    let padding = (area.width as usize).saturating_sub(used + help_hint.len() + 2);

    let mut spans = title_line.spans;
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(Span::styled(help_hint, styles::muted_style()));

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_pages(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, page.title());
        spans.push(Span::styled(label, styles::tab_style(app.nav.page == *page)));
    }

    // Current location on the right, like an address bar
    let location = app.nav.location().to_fragment();
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let padding = (area.width as usize).saturating_sub(used + location.chars().count() + 2);
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(Span::styled(location, styles::muted_style()));

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_notice(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref error) = app.content.error else {
        return;
    };
    let line = Line::from(vec![
        Span::styled(format!(" ⚠ {}", error), styles::error_style()),
        Span::styled("  [Esc] dismiss", styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.nav.page {
        Page::Home => home::render(frame, app, area),
        Page::History => history::render(frame, app, area),
        Page::Gallery => gallery::render(frame, app, area),
        Page::Events => events::render(frame, app, area),
    }
}

/// Left side of the status bar: what the content layer is doing.
fn content_status(app: &App) -> String {
    let view = &app.content;
    let age = view.last_updated.map(age_display);
    match (view.state, age) {
        (RefreshState::Idle, _) => "Starting...".to_string(),
        (RefreshState::InitialLoading, _) => "Loading content...".to_string(),
        (RefreshState::BackgroundRefreshing, _) => "Checking for updates...".to_string(),
        (RefreshState::CacheHit, Some(age)) => format!("Saved copy from {}", age),
        (RefreshState::Fresh, Some(age)) if view.is_from_cache => {
            format!("Up to date (checked, saved {})", age)
        }
        (RefreshState::Fresh, Some(age)) => format!("Updated {}", age),
        (RefreshState::Error, Some(age)) => format!("Offline, saved copy from {}", age),
        (RefreshState::Error, None) => "Offline, showing default content".to_string(),
        (RefreshState::CacheHit | RefreshState::Fresh, None) => {
            view.cache_status.label().to_string()
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} ", content_status(app)),
    };
    let back_hint = if app.can_go_back() { "[⌫] back | " } else { "" };
    let right_text = format!(" {}[u]pdate | [C]lear cache | [q]uit ", back_hint);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

/// The URL a viewer should load for `image`, with the fallback position.
pub fn image_lines(image: &ImageRef, failures: usize) -> Vec<Line<'_>> {
    let attempts = image.attempts_after(failures);
    match attempts.current() {
        Some(url) => vec![
            Line::from(Span::styled(url, styles::list_item_style())),
            Line::from(Span::styled(
                format!(
                    "source {} of {} - [x] if it fails to load",
                    attempts.failures() + 1,
                    image.candidate_count()
                ),
                styles::muted_style(),
            )),
        ],
        None => vec![Line::from(Span::styled(
            "No image available",
            styles::muted_style(),
        ))],
    }
}

fn render_officer_modal(frame: &mut Frame, app: &App, name: &str) {
    let area = centered_rect_percent(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let lines = match app.modal_officer() {
        Some(officer) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("{} {}", officer.flag, officer.name).trim().to_string(),
                    styles::title_style(),
                )),
                Line::from(Span::styled(officer.role.as_str(), styles::highlight_style())),
                Line::from(""),
            ];
            let fields = [
                ("Year:    ", officer.year.as_str()),
                ("Major:   ", officer.major.as_str()),
                ("Country: ", officer.country.as_str()),
            ];
            for (label, value) in fields {
                if !value.is_empty() {
                    lines.push(Line::from(vec![
                        Span::styled(label, styles::muted_style()),
                        Span::raw(value),
                    ]));
                }
            }
            if !officer.quote.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("\"{}\"", officer.quote),
                    styles::list_item_style(),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Photo", styles::highlight_style())));
            lines.extend(image_lines(&officer.image, app.image_failures));
            lines
        }
        None => vec![Line::from(Span::styled(
            format!("No officer named {}", name),
            styles::error_style(),
        ))],
    };

    render_modal(frame, area, " Officer - [Esc] close ", lines);
}

fn render_gallery_modal(frame: &mut Frame, app: &App, id: &str) {
    let area = centered_rect_percent(70, 70, frame.area());
    frame.render_widget(Clear, area);

    let lines = match app.modal_gallery() {
        Some(gallery) => {
            let mut lines = vec![
                Line::from(Span::styled(gallery.title.as_str(), styles::title_style())),
                Line::from(Span::styled(
                    format!("{}  {}", gallery.date, plural(gallery.image_count, "photo"))
                        .trim()
                        .to_string(),
                    styles::muted_style(),
                )),
                Line::from(""),
            ];
            if !gallery.description.is_empty() {
                lines.push(Line::from(gallery.description.as_str()));
                lines.push(Line::from(""));
            }
            match gallery.images.get(app.image_selection) {
                Some(image) => {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("[{}/{}] ", app.image_selection + 1, gallery.images.len()),
                            styles::highlight_style(),
                        ),
                        Span::raw(image.caption.as_str()),
                    ]));
                    lines.extend(image_lines(&image.image, app.image_failures));
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        "←/→ browse photos",
                        styles::muted_style(),
                    )));
                }
                None => lines.push(Line::from(Span::styled(
                    "This gallery has no photos yet.",
                    styles::muted_style(),
                ))),
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            format!("Gallery {} is not available", id),
            styles::error_style(),
        ))],
    };

    render_modal(frame, area, " Gallery - [Esc] close ", lines);
}

fn render_modal(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn help_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  clubcache", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-4", "Switch pages"),
        help_line("Tab/←/→", "Prev/next page (photos in a gallery)"),
        help_line("↑/↓", "Navigate list"),
        help_line("Enter", "Open officer or gallery"),
        help_line("Esc", "Close / dismiss notice"),
        help_line("⌫ / [", "Back"),
        help_line("]", "Forward"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("u", "Refresh content and events"),
        help_line("C", "Clear cache and reload"),
        help_line("d", "Dismiss error notice"),
        help_line("x", "Image failed, try next source"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_confirm_overlay(frame: &mut Frame, question: &str) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to confirm, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn centered_rect_percent(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    centered_rect_fixed(r.width * percent_x / 100, r.height * percent_y / 100, r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubcache_core::navigation::Location;
    use clubcache_core::ContentError;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn offline_app(start: &str) -> App {
        let error = ContentError::ConfigurationMissing("CLUBCACHE_API_KEY".to_string());
        App::new(Err(error), Location::parse(start)).unwrap()
    }

    #[test]
    fn test_fallback_gallery_is_rendered() {
        let screen = draw(&offline_app("#gallery"));
        assert!(screen.contains("Welcome Night"));
        assert!(screen.contains("Offline, showing default content"));
        assert!(screen.contains("CLUBCACHE_API_KEY"));
    }

    #[test]
    fn test_gallery_modal_shows_image_source() {
        let screen = draw(&offline_app("#gallery?event=sample"));
        assert!(screen.contains("/images/sample-gallery.jpg"));
        assert!(screen.contains("source 1 of 2"));
    }

    #[test]
    fn test_unknown_officer_modal() {
        let screen = draw(&offline_app("#home?officer=Nobody"));
        assert!(screen.contains("No officer named Nobody"));
    }
}
