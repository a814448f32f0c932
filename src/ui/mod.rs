pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::update::CrashReport;
use crate::app::{AppState, Modal};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let palette = app.theme.palette();
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(root[1]);

    let total = app
        .cache
        .list
        .data
        .as_ref()
        .map(|l| l.total.to_string())
        .unwrap_or_else(|| "-".to_string());
    let p = Paragraph::new(format!(
        "usradmin  users:{total}  theme:{}  — n: new; e/Enter: edit; d: delete; t: theme; q: quit",
        app.theme.label()
    ))
    .block(
        Block::default()
            .title("usradmin")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border)),
    )
    .style(Style::default().fg(palette.header_fg).bg(palette.header_bg));
    f.render_widget(p, root[0]);

    users::render_user_list(f, body[0], app, &palette);
    users::render_detail_pane(f, body[1], app, &palette);

    components::render_status_bar(f, root[2], app, &palette);

    if app.create_panel.is_some() {
        users::render_create_modal(f, f.area(), app, &palette);
    }
    if let Some(Modal::ConfirmDelete { name, selected, .. }) = app.modal.clone() {
        components::render_confirm_modal(f, f.area(), &name, selected, &palette);
    }
}

/// Recovery view shown after a caught rendering panic. Styled on its own
/// fixed palette so it never depends on the crashed state.
pub fn render_crash(f: &mut Frame, report: &CrashReport) {
    components::render_crash_screen(f, f.area(), report);
}
