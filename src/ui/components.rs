//! Shared UI components (status bar, modal helpers, crash screen).
//!
//! Contains small building blocks reused across the users screen.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::update::CrashReport;
use crate::app::{AppState, Focus};
use crate::theme::Palette;

/// Render the bottom status bar: focus, pending operations, notices and
/// delete errors.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState, palette: &Palette) {
    let mode = match app.focus {
        Focus::List => "NORMAL",
        Focus::CreateForm => "CREATE",
        Focus::EditForm => "EDIT",
        Focus::Confirm => "CONFIRM",
    };
    let mut parts = vec![format!("mode: {mode}")];
    if app.create_mut.is_pending() {
        parts.push("creating...".to_string());
    }
    if app.update_mut.is_pending() {
        parts.push("saving...".to_string());
    }
    if app.delete_mut.is_pending() {
        parts.push("deleting...".to_string());
    }
    if let Some(err) = app.delete_mut.error() {
        parts.push(format!("Error: {err} (Esc to dismiss)"));
    }
    if let Some(notice) = &app.notice {
        parts.push(notice.clone());
    }
    let p = Paragraph::new(parts.join("  ")).style(
        Style::default()
            .fg(palette.status_fg)
            .bg(palette.status_bg),
    );
    f.render_widget(p, area);
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Yes/no confirmation dialog shown before a delete is dispatched.
pub fn render_confirm_modal(
    f: &mut Frame,
    area: Rect,
    name: &str,
    selected: usize,
    palette: &Palette,
) {
    let rect = centered_rect(54, 7, area);
    let yes = if selected == 0 { "[Yes]" } else { " Yes " };
    let no = if selected == 1 { "[No]" } else { " No  " };
    let body = format!(
        "Are you sure you want to delete this user?\n'{name}'\n\n  {yes}    {no}"
    );
    let p = Paragraph::new(body).style(Style::default().fg(palette.text)).block(
        Block::default()
            .title("Confirm delete")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Full-screen recovery view after a caught rendering panic. Deliberately
/// styled on a fixed palette: the crashed state is not consulted for
/// anything, not even theming.
pub fn render_crash_screen(f: &mut Frame, area: Rect, report: &CrashReport) {
    let palette = Palette::dark();
    let mut body = format!(
        "Something went wrong\n\n{}\n(at {})\n\n",
        report.message, report.location
    );
    if cfg!(debug_assertions) && !report.trace.is_empty() {
        body.push_str(&report.trace);
        body.push('\n');
    }
    body.push_str("r: reload application    q: quit");
    let p = Paragraph::new(body)
        .style(Style::default().fg(palette.error).add_modifier(Modifier::BOLD))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Error")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.error)),
        );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
