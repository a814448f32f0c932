use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::{AppState, FormField, Selection, UserForm};
use crate::theme::Palette;

pub fn render_user_list(f: &mut Frame, area: Rect, app: &mut AppState, palette: &Palette) {
    let block = Block::default()
        .title("Users")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));

    if let Some(err) = app.cache.list.error.clone() {
        let p = Paragraph::new(format!("Error: {err}"))
            .style(Style::default().fg(palette.error))
            .wrap(Wrap { trim: false })
            .block(block);
        f.render_widget(p, area);
        return;
    }
    if app.cache.list.is_loading() {
        let p = Paragraph::new("Loading users...")
            .style(Style::default().fg(palette.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    }
    if app.users().is_empty() {
        let p = Paragraph::new("No users yet.")
            .style(Style::default().fg(palette.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let selected = app.selected_index();
    let start = (selected.unwrap_or(0) / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(app.users().len());
    let slice = &app.users()[start..end];

    let rows = slice.iter().enumerate().map(|(i, u)| {
        let absolute_index = start + i;
        let style = if Some(absolute_index) == selected {
            Style::default()
                .fg(palette.highlight_fg)
                .bg(palette.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text)
        };
        Row::new(vec![
            Cell::from(u.id.clone()),
            Cell::from(u.name.clone()),
            Cell::from(u.email.clone()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(10),
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ];
    let header = Row::new(vec!["ID", "NAME", "EMAIL"])
        .style(Style::default().fg(palette.title).add_modifier(Modifier::BOLD));

    let table = Table::new(rows, widths).header(header).block(block).column_spacing(1);
    f.render_widget(table, area);
}

/// Right-hand pane: the selected user's details, or the edit form while in
/// edit mode.
pub fn render_detail_pane(f: &mut Frame, area: Rect, app: &AppState, palette: &Palette) {
    let base = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));

    if let Selection::Editing { id, form } = &app.selection {
        render_edit_form(f, area, app, id, form, palette, base.title("Edit User"));
        return;
    }
    let block = base.title("User Details");

    let Some(id) = app.selected_id() else {
        let p = Paragraph::new("Select a user from the list to view details.")
            .style(Style::default().fg(palette.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    };

    let entry = app.cache.detail(id);
    if let Some(err) = entry.and_then(|e| e.error.clone()) {
        let p = Paragraph::new(format!("Error: {err}"))
            .style(Style::default().fg(palette.error))
            .wrap(Wrap { trim: false })
            .block(block);
        f.render_widget(p, area);
        return;
    }
    let Some(user) = entry.and_then(|e| e.data.as_ref()) else {
        let p = Paragraph::new("Loading user details...")
            .style(Style::default().fg(palette.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    };

    let mut text = format!(
        "ID: {}\nName: {}\nEmail: {}\nCreated At: {}\nUpdated At: {}",
        user.id, user.name, user.email, user.created_at, user.updated_at
    );
    if app.delete_mut.is_pending() {
        text.push_str("\n\nDeleting...");
    } else {
        text.push_str("\n\ne: edit  d: delete");
    }
    let p = Paragraph::new(text)
        .style(Style::default().fg(palette.text))
        .block(block);
    f.render_widget(p, area);
}

fn render_edit_form(
    f: &mut Frame,
    area: Rect,
    app: &AppState,
    id: &str,
    form: &UserForm,
    palette: &Palette,
    block: Block,
) {
    let mut lines = vec![format!("ID: {id}"), String::new()];
    push_form_lines(&mut lines, form);
    lines.push(String::new());
    if app.update_mut.is_pending() {
        lines.push("Saving...".to_string());
    } else {
        lines.push("Enter: save  Esc: cancel  Tab: field".to_string());
    }
    if let Some(err) = app.update_mut.error() {
        lines.push(format!("Error: {err}"));
    }
    let p = Paragraph::new(lines.join("\n"))
        .style(Style::default().fg(palette.text))
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(p, area);
}

/// Centered create dialog, shown while the create panel is open.
pub fn render_create_modal(f: &mut Frame, area: Rect, app: &AppState, palette: &Palette) {
    let Some(form) = app.create_panel.as_ref() else {
        return;
    };
    let width = 60u16.min(area.width.saturating_sub(4)).max(40);
    let height = 12u16.min(area.height.saturating_sub(4)).max(8);
    let rect = crate::ui::components::centered_rect(width, height, area);

    let mut lines = Vec::new();
    push_form_lines(&mut lines, form);
    lines.push(String::new());
    if app.create_mut.is_pending() {
        lines.push("Creating...".to_string());
    } else {
        lines.push("Enter: create  Esc: cancel  Tab: field".to_string());
    }
    if let Some(err) = app.create_mut.error() {
        lines.push(format!("Error: {err}"));
    }

    let p = Paragraph::new(lines.join("\n"))
        .style(Style::default().fg(palette.text))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Create New User")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

fn push_form_lines(lines: &mut Vec<String>, form: &UserForm) {
    let name_marker = if form.field == FormField::Name { "▶" } else { " " };
    let email_marker = if form.field == FormField::Email { "▶" } else { " " };
    lines.push(format!("{name_marker} Name:  {}", form.name));
    if let Some(msg) = form.errors.name {
        lines.push(format!("    {msg}"));
    }
    lines.push(format!("{email_marker} Email: {}", form.email));
    if let Some(msg) = form.errors.email {
        lines.push(format!("    {msg}"));
    }
}
