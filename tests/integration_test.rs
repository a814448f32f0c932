// Integration tests for usradmin-tui
//
// Full flows through the public API: key events in, dispatched requests and
// synthetic settlements out. No terminal, no network.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{SystemTime, UNIX_EPOCH};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use usradmin_tui::api::{ApiError, ApiRequest, ApiResponse, User, UserList};
use usradmin_tui::app::update::{Boundary, apply_settlement, handle_key, pump_queries};
use usradmin_tui::app::{AppState, Focus, Modal, Selection};
use usradmin_tui::theme::{DarkSignal, ThemeManager};
use usradmin_tui::validate::{MSG_EMAIL_INVALID, MSG_NAME_REQUIRED};

struct FixedSignal(bool);

impl DarkSignal for FixedSignal {
    fn prefers_dark(&self) -> bool {
        self.0
    }
}

fn tmp_theme(tag: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    let n = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    p.push(format!("usradmin_it_{tag}_{}_{}", std::process::id(), n));
    p
}

fn mk_app(tag: &str) -> (AppState, mpsc::Receiver<ApiRequest>) {
    let (tx, rx) = mpsc::channel();
    let theme = ThemeManager::new(tmp_theme(tag), Box::new(FixedSignal(true)));
    (AppState::new(1, tx, theme), rx)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_str(app: &mut AppState, s: &str) {
    for c in s.chars() {
        handle_key(app, key(KeyCode::Char(c)));
    }
}

fn drain(rx: &mpsc::Receiver<ApiRequest>) -> Vec<ApiRequest> {
    let mut out = Vec::new();
    while let Ok(req) = rx.try_recv() {
        out.push(req);
    }
    out
}

fn user(id: &str, name: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        created_at: "2025-01-01T00:00:00Z".to_string(),
        updated_at: "2025-01-02T00:00:00Z".to_string(),
    }
}

/// Pump the initial list fetch and settle it with the given users.
fn seed_list(app: &mut AppState, rx: &mpsc::Receiver<ApiRequest>, users: Vec<User>) {
    pump_queries(app);
    drain(rx);
    let total = users.len() as u64;
    apply_settlement(
        app,
        ApiResponse::List {
            generation: 1,
            result: Ok(UserList { users, total }),
        },
    );
}

/// Select the first row and settle its detail query.
fn select_first(app: &mut AppState, rx: &mpsc::Receiver<ApiRequest>) -> User {
    handle_key(app, key(KeyCode::Down));
    pump_queries(app);
    drain(rx);
    let selected = app
        .users()
        .iter()
        .find(|u| Some(u.id.as_str()) == app.selected_id())
        .cloned()
        .expect("a row is selected");
    apply_settlement(
        app,
        ApiResponse::Detail {
            generation: 1,
            id: selected.id.clone(),
            result: Ok(selected.clone()),
        },
    );
    selected
}

#[test]
fn create_flow_dispatches_once_and_closes_panel_on_success() {
    let (mut app, rx) = mk_app("create");
    seed_list(&mut app, &rx, vec![]);

    handle_key(&mut app, key(KeyCode::Char('n')));
    assert!(app.create_panel.is_some());
    assert_eq!(app.focus, Focus::CreateForm);

    type_str(&mut app, "John Doe");
    handle_key(&mut app, key(KeyCode::Tab));
    type_str(&mut app, "john@example.com");
    handle_key(&mut app, key(KeyCode::Enter));

    let reqs = drain(&rx);
    assert_eq!(reqs.len(), 1);
    let ApiRequest::CreateUser { seq, input, .. } = &reqs[0] else {
        panic!("expected a create dispatch, got {reqs:?}");
    };
    assert_eq!(input.name, "John Doe");
    assert_eq!(input.email, "john@example.com");
    assert!(app.create_mut.is_pending());

    // re-invoking while pending has no additional effect
    handle_key(&mut app, key(KeyCode::Enter));
    assert!(drain(&rx).is_empty());

    apply_settlement(
        &mut app,
        ApiResponse::Created {
            generation: 1,
            seq: *seq,
            result: Ok(user("u1", "John Doe", "john@example.com")),
        },
    );
    assert!(app.create_panel.is_none());
    assert_eq!(app.focus, Focus::List);
    assert_eq!(app.notice.as_deref(), Some("User created successfully!"));

    // the list was marked stale and exactly one refetch goes out
    assert!(app.cache.list.needs_fetch());
    pump_queries(&mut app);
    let reqs = drain(&rx);
    assert!(matches!(reqs.as_slice(), [ApiRequest::FetchList { .. }]));
}

#[test]
fn invalid_create_input_never_reaches_the_network() {
    let (mut app, rx) = mk_app("create_invalid");
    seed_list(&mut app, &rx, vec![]);

    handle_key(&mut app, key(KeyCode::Char('n')));
    handle_key(&mut app, key(KeyCode::Enter));

    assert!(drain(&rx).is_empty());
    let form = app.create_panel.as_ref().unwrap();
    assert_eq!(form.errors.name, Some(MSG_NAME_REQUIRED));
    assert_eq!(form.errors.email, Some(MSG_EMAIL_INVALID));
}

#[test]
fn update_exits_edit_mode_only_after_success() {
    let (mut app, rx) = mk_app("update");
    seed_list(
        &mut app,
        &rx,
        vec![
            user("a", "Alice", "alice@example.com"),
            user("b", "Bob", "bob@example.com"),
        ],
    );
    let selected = select_first(&mut app, &rx);
    assert_eq!(selected.id, "a");

    handle_key(&mut app, key(KeyCode::Char('e')));
    assert!(app.selection.is_editing());

    type_str(&mut app, "!");
    handle_key(&mut app, key(KeyCode::Enter));

    let reqs = drain(&rx);
    let [ApiRequest::UpdateUser { seq, id, input, .. }] = reqs.as_slice() else {
        panic!("expected an update dispatch, got {reqs:?}");
    };
    assert_eq!(id, "a");
    assert_eq!(input.name, "Alice!");
    // submission alone does not leave edit mode
    assert!(app.selection.is_editing());

    apply_settlement(
        &mut app,
        ApiResponse::Updated {
            generation: 1,
            seq: *seq,
            id: "a".to_string(),
            result: Ok(user("a", "Alice!", "alice@example.com")),
        },
    );
    assert_eq!(app.selection, Selection::Viewing { id: "a".to_string() });
    assert_eq!(app.focus, Focus::List);

    // list and selected detail both refetch
    pump_queries(&mut app);
    let reqs = drain(&rx);
    assert_eq!(reqs.len(), 2);
    assert!(reqs.iter().any(|r| matches!(r, ApiRequest::FetchList { .. })));
    assert!(
        reqs.iter()
            .any(|r| matches!(r, ApiRequest::FetchUser { id, .. } if id == "a"))
    );
}

#[test]
fn failed_update_stays_in_edit_mode_with_message() {
    let (mut app, rx) = mk_app("update_err");
    seed_list(&mut app, &rx, vec![user("a", "Alice", "alice@example.com")]);
    select_first(&mut app, &rx);

    handle_key(&mut app, key(KeyCode::Char('e')));
    handle_key(&mut app, key(KeyCode::Enter));
    let reqs = drain(&rx);
    let [ApiRequest::UpdateUser { seq, .. }] = reqs.as_slice() else {
        panic!("expected an update dispatch");
    };

    apply_settlement(
        &mut app,
        ApiResponse::Updated {
            generation: 1,
            seq: *seq,
            id: "a".to_string(),
            result: Err(ApiError::Rejected("email already exists".to_string())),
        },
    );
    assert!(app.selection.is_editing());
    assert_eq!(app.update_mut.error(), Some("email already exists"));
    // retry is manual: the next submit dispatches again
    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(drain(&rx).len(), 1);
}

#[test]
fn declined_delete_confirmation_does_nothing() {
    let (mut app, rx) = mk_app("delete_declined");
    seed_list(&mut app, &rx, vec![user("a", "Alice", "alice@example.com")]);
    select_first(&mut app, &rx);

    handle_key(&mut app, key(KeyCode::Char('d')));
    assert!(matches!(app.modal, Some(Modal::ConfirmDelete { .. })));
    assert_eq!(app.focus, Focus::Confirm);

    // "No" is the default answer
    handle_key(&mut app, key(KeyCode::Enter));
    assert!(app.modal.is_none());
    assert_eq!(app.focus, Focus::List);
    assert!(drain(&rx).is_empty());
    assert_eq!(app.selected_id(), Some("a"));
    assert!(!app.delete_mut.is_pending());
}

#[test]
fn confirmed_delete_clears_selection_and_drops_detail() {
    let (mut app, rx) = mk_app("delete_confirmed");
    seed_list(&mut app, &rx, vec![user("a", "Alice", "alice@example.com")]);
    select_first(&mut app, &rx);

    handle_key(&mut app, key(KeyCode::Char('d')));
    handle_key(&mut app, key(KeyCode::Char('y')));

    let reqs = drain(&rx);
    let [ApiRequest::DeleteUser { seq, id, .. }] = reqs.as_slice() else {
        panic!("expected a delete dispatch, got {reqs:?}");
    };
    assert_eq!(id, "a");

    apply_settlement(
        &mut app,
        ApiResponse::Deleted {
            generation: 1,
            seq: *seq,
            id: "a".to_string(),
            result: Ok(()),
        },
    );
    assert_eq!(app.selection, Selection::None);
    assert!(app.cache.detail("a").is_none());
    assert!(app.cache.list.needs_fetch());
}

#[test]
fn selecting_another_row_while_editing_discards_the_edit() {
    let (mut app, rx) = mk_app("reselect");
    seed_list(
        &mut app,
        &rx,
        vec![
            user("a", "Alice", "alice@example.com"),
            user("b", "Bob", "bob@example.com"),
        ],
    );
    select_first(&mut app, &rx);

    handle_key(&mut app, key(KeyCode::Char('e')));
    type_str(&mut app, "unsaved");
    assert!(app.selection.is_editing());

    handle_key(&mut app, key(KeyCode::Down));
    assert_eq!(app.selection, Selection::Viewing { id: "b".to_string() });
    assert_eq!(app.focus, Focus::List);
    // no update was ever dispatched for the abandoned edit
    assert!(drain(&rx).is_empty());
}

#[test]
fn reselecting_the_edited_row_keeps_the_edit() {
    let (mut app, rx) = mk_app("reselect_same");
    seed_list(&mut app, &rx, vec![user("a", "Alice", "alice@example.com")]);
    select_first(&mut app, &rx);

    handle_key(&mut app, key(KeyCode::Char('e')));
    // moving up from the only row lands on the same id
    handle_key(&mut app, key(KeyCode::Up));
    assert!(app.selection.is_editing());
    assert_eq!(app.focus, Focus::EditForm);
}

#[test]
fn settlements_from_an_older_generation_are_dropped() {
    let (mut app, rx) = mk_app("generation");
    seed_list(&mut app, &rx, vec![user("a", "Alice", "alice@example.com")]);
    assert_eq!(app.users().len(), 1);

    // a settlement stamped with a foreign generation never lands
    apply_settlement(
        &mut app,
        ApiResponse::List {
            generation: 7,
            result: Ok(UserList { users: vec![], total: 0 }),
        },
    );
    assert_eq!(app.users().len(), 1);
}

#[test]
fn boundary_catches_panics_and_reports_the_message() {
    let mut boundary = Boundary::install();
    assert_eq!(boundary.supervise(|| 41 + 1), Some(42));
    assert!(boundary.crash.is_none());

    let out = boundary.supervise(|| -> u32 { panic!("boom") });
    assert_eq!(out, None);
    let report = boundary.crash.as_ref().expect("crash recorded");
    assert_eq!(report.message, "boom");
    assert!(!report.location.is_empty());
}
