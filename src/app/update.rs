//! Event loop, key handling, and settlement application.
//!
//! The UI thread is the only place app state is touched: key events mutate
//! local intent, mutation requests go out over the worker channel, and
//! settlements are drained back in and applied here. The whole frame step
//! runs under a panic boundary; a caught panic swaps in the crash view and
//! the only recovery is a full state rebuild.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, error, info, warn};

use crate::api::{ApiRequest, ApiResponse};
use crate::app::mutation::MutationKind;
use crate::app::{AppState, Focus, Modal, Selection, UserForm};
use crate::theme::{TermDarkSignal, ThemeManager};
use crate::ui;
use crate::validate::validate_user_input;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Diagnostic captured by the panic hook at panic time, before unwinding
/// destroys the original context.
#[derive(Clone, Debug)]
pub struct CrashReport {
    pub message: String,
    pub location: String,
    pub trace: String,
}

/// Supervisor for the frame step: catches panics from the delegated
/// render/update closure and holds the crash state until the user triggers
/// a reload. The hook write and the catch are paired through a shared slot.
pub struct Boundary {
    slot: Arc<Mutex<Option<CrashReport>>>,
    pub crash: Option<CrashReport>,
}

impl Boundary {
    /// Install the capturing panic hook. The default hook would print over
    /// the alternate screen, so it is replaced for the process lifetime.
    pub fn install() -> Self {
        let slot: Arc<Mutex<Option<CrashReport>>> = Arc::new(Mutex::new(None));
        let hook_slot = slot.clone();
        panic::set_hook(Box::new(move |info| {
            let report = CrashReport {
                message: payload_message(info.payload()),
                location: info
                    .location()
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "unknown location".to_string()),
                trace: std::backtrace::Backtrace::force_capture().to_string(),
            };
            if let Ok(mut slot) = hook_slot.lock() {
                *slot = Some(report);
            }
        }));
        Self { slot, crash: None }
    }

    /// Run the delegated step. On panic, record the crash and return `None`;
    /// the caller substitutes the recovery view.
    pub fn supervise<T>(&mut self, step: impl FnOnce() -> T) -> Option<T> {
        match panic::catch_unwind(AssertUnwindSafe(step)) {
            Ok(value) => Some(value),
            Err(payload) => {
                let report = self
                    .slot
                    .lock()
                    .ok()
                    .and_then(|mut slot| slot.take())
                    .unwrap_or_else(|| CrashReport {
                        message: payload_message(payload.as_ref()),
                        location: "unknown location".to_string(),
                        trace: String::new(),
                    });
                error!(
                    message = %report.message,
                    location = %report.location,
                    "caught rendering panic\n{}",
                    report.trace
                );
                self.crash = Some(report);
                None
            }
        }
    }
}

fn payload_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "An unexpected error occurred.".to_string()
    }
}

/// Run the application loop until quit. Owns the reload cycle: after a
/// caught crash, `r` rebuilds the entire `AppState` under a new generation,
/// so settlements from the previous instance are dropped on arrival.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    api_tx: Sender<ApiRequest>,
    api_rx: Receiver<ApiResponse>,
    theme_file: PathBuf,
) -> Result<()> {
    let mut boundary = Boundary::install();
    let mut generation: u64 = 1;
    let mut app = AppState::new(
        generation,
        api_tx.clone(),
        ThemeManager::new(&theme_file, Box::new(TermDarkSignal)),
    );
    pump_queries(&mut app);

    loop {
        if let Some(report) = boundary.crash.clone() {
            terminal.draw(|f| ui::render_crash(f, &report))?;
            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('r') => {
                                generation += 1;
                                info!(generation, "full reload after crash");
                                app = AppState::new(
                                    generation,
                                    api_tx.clone(),
                                    ThemeManager::new(&theme_file, Box::new(TermDarkSignal)),
                                );
                                boundary.crash = None;
                                pump_queries(&mut app);
                            }
                            KeyCode::Char('q') => break,
                            _ => {}
                        }
                    }
                }
            }
            continue;
        }

        match boundary.supervise(|| terminal.draw(|f| ui::render(f, &mut app)).map(|_| ())) {
            Some(drawn) => drawn?,
            None => continue,
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && boundary.supervise(|| handle_key(&mut app, key)).is_none()
                {
                    continue;
                }
            }
        }

        loop {
            match api_rx.try_recv() {
                Ok(resp) => apply_settlement(&mut app, resp),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => bail!("api worker disconnected"),
            }
        }

        app.theme.poll();
        pump_queries(&mut app);

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Route a key press to the focused surface.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    match app.focus {
        Focus::List => handle_list_key(app, key.code),
        Focus::CreateForm => handle_create_key(app, key.code),
        Focus::EditForm => handle_edit_key(app, key.code),
        Focus::Confirm => handle_confirm_key(app, key.code),
    }
}

fn handle_list_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('t') => {
            app.theme.cycle();
        }
        KeyCode::Esc => {
            // First press dismisses transient messages, second clears the
            // selection.
            if app.notice.is_some() || app.delete_mut.error().is_some() {
                app.notice = None;
                app.delete_mut.dismiss_error();
            } else {
                app.selection.clear();
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp | KeyCode::Left | KeyCode::Char('h') => {
            app.move_selection(-(app.rows_per_page.max(1) as isize));
        }
        KeyCode::PageDown | KeyCode::Right | KeyCode::Char('l') => {
            app.move_selection(app.rows_per_page.max(1) as isize);
        }
        KeyCode::Char('n') => toggle_create_panel(app),
        KeyCode::Char('e') | KeyCode::Enter => start_edit(app),
        KeyCode::Char('d') | KeyCode::Delete => request_delete(app),
        _ => {}
    }
}

fn handle_create_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.create_panel = None;
            app.create_mut.dismiss_error();
            app.focus = Focus::List;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            if let Some(form) = app.create_panel.as_mut() {
                form.next_field();
            }
        }
        KeyCode::Enter => submit_create(app),
        KeyCode::Backspace => {
            if let Some(form) = app.create_panel.as_mut() {
                form.backspace();
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.create_panel.as_mut() {
                form.push_char(c);
            }
        }
        _ => {}
    }
}

fn handle_edit_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.selection.exit_edit();
            app.update_mut.dismiss_error();
            app.focus = Focus::List;
        }
        // Selecting another row abandons the in-progress edit silently.
        KeyCode::Up => {
            app.move_selection(-1);
            if !app.selection.is_editing() {
                app.focus = Focus::List;
            }
        }
        KeyCode::Down => {
            app.move_selection(1);
            if !app.selection.is_editing() {
                app.focus = Focus::List;
            }
        }
        KeyCode::Tab | KeyCode::BackTab => {
            if let Selection::Editing { form, .. } = &mut app.selection {
                form.next_field();
            }
        }
        KeyCode::Enter => submit_update(app),
        KeyCode::Backspace => {
            if let Selection::Editing { form, .. } = &mut app.selection {
                form.backspace();
            }
        }
        KeyCode::Char(c) => {
            if let Selection::Editing { form, .. } = &mut app.selection {
                form.push_char(c);
            }
        }
        _ => {}
    }
}

fn handle_confirm_key(app: &mut AppState, code: KeyCode) {
    let Some(Modal::ConfirmDelete { id, selected, .. }) = app.modal.clone() else {
        return;
    };
    match code {
        KeyCode::Esc | KeyCode::Char('n') => close_modal(app),
        KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            if let Some(Modal::ConfirmDelete { selected, .. }) = app.modal.as_mut() {
                *selected = if *selected == 0 { 1 } else { 0 };
            }
        }
        KeyCode::Char('y') => dispatch_delete(app, id),
        KeyCode::Enter => {
            if selected == 0 {
                dispatch_delete(app, id);
            } else {
                close_modal(app);
            }
        }
        _ => {}
    }
}

fn close_modal(app: &mut AppState) {
    app.modal = None;
    app.focus = Focus::List;
}

/// Open the create panel, or close it when already open (the toggle doubles
/// as Cancel).
fn toggle_create_panel(app: &mut AppState) {
    if app.create_panel.is_some() {
        app.create_panel = None;
        app.create_mut.dismiss_error();
        app.focus = Focus::List;
    } else {
        app.create_panel = Some(UserForm::empty());
        app.focus = Focus::CreateForm;
    }
}

/// Enter edit mode for the selected user once its detail record is cached.
fn start_edit(app: &mut AppState) {
    let Some(user) = app.selected_user().cloned() else {
        return;
    };
    if app.selection.start_edit(&user) {
        app.focus = Focus::EditForm;
    }
}

/// Ask for confirmation before deleting the selected user. No mutation is
/// dispatched until the user answers yes.
fn request_delete(app: &mut AppState) {
    if app.delete_mut.is_pending() {
        return;
    }
    let Some(id) = app.selected_id().map(str::to_string) else {
        return;
    };
    let name = app
        .users()
        .iter()
        .find(|u| u.id == id)
        .map(|u| u.name.clone())
        .or_else(|| app.selected_user().map(|u| u.name.clone()))
        .unwrap_or_default();
    app.modal = Some(Modal::ConfirmDelete { id, name, selected: 1 });
    app.focus = Focus::Confirm;
}

fn submit_create(app: &mut AppState) {
    if app.create_mut.is_pending() {
        return;
    }
    let Some(form) = app.create_panel.as_mut() else {
        return;
    };
    match validate_user_input(&form.name, &form.email) {
        Err(errors) => {
            form.errors = errors;
        }
        Ok(input) => {
            form.errors = Default::default();
            if let Some(seq) = app.create_mut.begin() {
                dispatch(
                    app,
                    ApiRequest::CreateUser {
                        generation: app.generation,
                        seq,
                        input,
                    },
                );
            }
        }
    }
}

fn submit_update(app: &mut AppState) {
    if app.update_mut.is_pending() {
        return;
    }
    let Selection::Editing { id, form } = &mut app.selection else {
        return;
    };
    let id = id.clone();
    match validate_user_input(&form.name, &form.email) {
        Err(errors) => {
            form.errors = errors;
        }
        Ok(input) => {
            form.errors = Default::default();
            if let Some(seq) = app.update_mut.begin() {
                dispatch(
                    app,
                    ApiRequest::UpdateUser {
                        generation: app.generation,
                        seq,
                        id,
                        input,
                    },
                );
            }
        }
    }
}

fn dispatch_delete(app: &mut AppState, id: String) {
    close_modal(app);
    if let Some(seq) = app.delete_mut.begin() {
        dispatch(
            app,
            ApiRequest::DeleteUser {
                generation: app.generation,
                seq,
                id,
            },
        );
    }
}

fn dispatch(app: &AppState, req: ApiRequest) {
    if app.api_tx.send(req).is_err() {
        warn!("api worker unavailable, request dropped");
    }
}

/// Apply one settlement from the worker. Settlements stamped with a stale
/// generation (the app was rebuilt) or a stale sequence (the tracker was
/// reset) are dropped without side effects. Invalidation and completion
/// effects run only on success settlements.
pub fn apply_settlement(app: &mut AppState, resp: ApiResponse) {
    match resp {
        ApiResponse::List { generation, result } => {
            if generation != app.generation {
                return;
            }
            app.cache.settle_list(result);
        }
        ApiResponse::Detail { generation, id, result } => {
            if generation != app.generation {
                return;
            }
            app.cache.settle_detail(&id, result);
        }
        ApiResponse::Created { generation, seq, result } => {
            if generation != app.generation {
                return;
            }
            match result {
                Ok(user) => {
                    if app.create_mut.settle_ok(seq) {
                        info!(id = %user.id, "user created");
                        let selected = app.selected_id().map(str::to_string);
                        app.cache
                            .invalidate_after_mutation(Some(&user.id), selected.as_deref());
                        app.create_panel = None;
                        if app.focus == Focus::CreateForm {
                            app.focus = Focus::List;
                        }
                        app.notice = Some(MutationKind::Create.success_notice().to_string());
                    }
                }
                Err(e) => {
                    app.create_mut.settle_err(seq, e.to_string());
                }
            }
        }
        ApiResponse::Updated { generation, seq, id, result } => {
            if generation != app.generation {
                return;
            }
            match result {
                Ok(_) => {
                    if app.update_mut.settle_ok(seq) {
                        info!(%id, "user updated");
                        let selected = app.selected_id().map(str::to_string);
                        app.cache
                            .invalidate_after_mutation(Some(&id), selected.as_deref());
                        // Editing -> Viewing happens only here, on success.
                        if app.selection.is_editing() && app.selected_id() == Some(id.as_str()) {
                            app.selection.exit_edit();
                            if app.focus == Focus::EditForm {
                                app.focus = Focus::List;
                            }
                        }
                        app.notice = Some(MutationKind::Update.success_notice().to_string());
                    }
                }
                Err(e) => {
                    app.update_mut.settle_err(seq, e.to_string());
                }
            }
        }
        ApiResponse::Deleted { generation, seq, id, result } => {
            if generation != app.generation {
                return;
            }
            match result {
                Ok(()) => {
                    if app.delete_mut.settle_ok(seq) {
                        info!(%id, "user deleted");
                        app.cache.invalidate_after_mutation(None, None);
                        app.cache.drop_detail(&id);
                        if app.selected_id() == Some(id.as_str()) {
                            app.selection.clear();
                            if app.focus == Focus::EditForm {
                                app.focus = Focus::List;
                            }
                        }
                        app.notice = Some(MutationKind::Delete.success_notice().to_string());
                    }
                }
                Err(e) => {
                    app.delete_mut.settle_err(seq, e.to_string());
                }
            }
        }
    }
}

/// Turn stale cache entries into fetch dispatches. The detail query runs
/// only while a selection exists. Claiming clears the stale mark, so
/// repeated invalidations collapse into one outstanding refetch.
pub fn pump_queries(app: &mut AppState) {
    if app.cache.list.needs_fetch() {
        app.cache.list.claim_fetch();
        debug!("refetching user list");
        dispatch(app, ApiRequest::FetchList { generation: app.generation });
    }
    if let Some(id) = app.selected_id().map(str::to_string) {
        let claimed = {
            let entry = app.cache.detail_mut(&id);
            if entry.needs_fetch() {
                entry.claim_fetch();
                true
            } else {
                false
            }
        };
        if claimed {
            debug!(%id, "refetching user detail");
            dispatch(
                app,
                ApiRequest::FetchUser {
                    generation: app.generation,
                    id,
                },
            );
        }
    }
}
