use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let site = &app.content.data.site;
    let changed = app.is_changed("site");

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Our history: {}", site.title),
            styles::title_style(),
        )),
        Line::from(""),
    ];

    if site.history.is_empty() {
        lines.push(Line::from(Span::styled(
            "Our story is still being written.",
            styles::muted_style(),
        )));
    }

    let paragraph_style = if changed {
        styles::changed_style()
    } else {
        styles::list_item_style()
    };
    for paragraph in &site.history {
        lines.push(Line::from(Span::styled(paragraph.as_str(), paragraph_style)));
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .title(" History ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
