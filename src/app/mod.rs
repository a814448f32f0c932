//! Application state types and entry glue.
//!
//! Defines the structs and enums that model the client state (cached
//! server resources, selection and edit mode, form buffers, mutation
//! trackers), as well as helpers to construct and navigate it. The event
//! loop lives in [`update`] (re-exported as `run`).

pub mod cache;
pub mod mutation;
pub mod update;

use std::sync::mpsc::Sender;

use crate::api::{ApiRequest, User};
use crate::theme::ThemeManager;
use crate::validate::FieldErrors;
use cache::QueryCache;
use mutation::{MutationKind, MutationTracker};

/// Which surface currently receives key input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    List,
    CreateForm,
    EditForm,
    Confirm,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FormField {
    #[default]
    Name,
    Email,
}

/// Input buffers and inline errors for the create/edit forms.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub field: FormField,
    pub errors: FieldErrors,
}

impl UserForm {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Edit form starts from the server-confirmed record.
    pub fn prefilled(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            ..Self::default()
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self.field {
            FormField::Name => self.name.push(c),
            FormField::Email => self.email.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.field {
            FormField::Name => {
                self.name.pop();
            }
            FormField::Email => {
                self.email.pop();
            }
        }
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Name => FormField::Email,
            FormField::Email => FormField::Name,
        };
    }
}

/// Selection and detail-pane mode. Edit-form state lives inside `Editing`,
/// so it structurally cannot outlive its subject.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Viewing { id: String },
    Editing { id: String, form: UserForm },
}

impl Selection {
    pub fn selected_id(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Viewing { id } | Self::Editing { id, .. } => Some(id),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }

    /// Select a user. Selecting a different id while editing discards the
    /// in-progress edit; re-selecting the id already being edited is a
    /// no-op.
    pub fn select(&mut self, id: String) {
        if self.is_editing() && self.selected_id() == Some(id.as_str()) {
            return;
        }
        *self = Self::Viewing { id };
    }

    pub fn clear(&mut self) {
        *self = Self::None;
    }

    /// Enter edit mode for the currently viewed user. Ignored without a
    /// selection or when the given record is not the selected one.
    pub fn start_edit(&mut self, user: &User) -> bool {
        match self {
            Self::Viewing { id } if *id == user.id => {
                *self = Self::Editing {
                    id: user.id.clone(),
                    form: UserForm::prefilled(user),
                };
                true
            }
            _ => false,
        }
    }

    /// Leave edit mode, back to viewing the same user. Used both for cancel
    /// and for the post-success transition.
    pub fn exit_edit(&mut self) {
        if let Self::Editing { id, .. } = self {
            *self = Self::Viewing { id: std::mem::take(id) };
        }
    }
}

/// Modal dialog states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Modal {
    /// Yes/no confirmation before the delete mutation. `selected`: 0 = Yes,
    /// 1 = No (the default).
    ConfirmDelete {
        id: String,
        name: String,
        selected: usize,
    },
}

pub struct AppState {
    /// Bumped on every full reload; settlements stamped with an older
    /// generation are dropped.
    pub generation: u64,
    pub api_tx: Sender<ApiRequest>,
    pub cache: QueryCache,
    pub selection: Selection,
    /// The create panel is independent of the selection machine.
    pub create_panel: Option<UserForm>,
    pub focus: Focus,
    pub modal: Option<Modal>,
    pub create_mut: MutationTracker,
    pub update_mut: MutationTracker,
    pub delete_mut: MutationTracker,
    pub theme: ThemeManager,
    /// Transient success notice for the status bar.
    pub notice: Option<String>,
    pub rows_per_page: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(generation: u64, api_tx: Sender<ApiRequest>, mut theme: ThemeManager) -> Self {
        theme.init();
        Self {
            generation,
            api_tx,
            cache: QueryCache::new(),
            selection: Selection::None,
            create_panel: None,
            focus: Focus::List,
            modal: None,
            create_mut: MutationTracker::new(MutationKind::Create),
            update_mut: MutationTracker::new(MutationKind::Update),
            delete_mut: MutationTracker::new(MutationKind::Delete),
            theme,
            notice: None,
            rows_per_page: 10,
            should_quit: false,
        }
    }

    pub fn tracker_mut(&mut self, kind: MutationKind) -> &mut MutationTracker {
        match kind {
            MutationKind::Create => &mut self.create_mut,
            MutationKind::Update => &mut self.update_mut,
            MutationKind::Delete => &mut self.delete_mut,
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.selected_id()
    }

    /// Users currently visible in the list pane (cached, possibly stale).
    pub fn users(&self) -> &[User] {
        self.cache
            .list
            .data
            .as_ref()
            .map(|l| l.users.as_slice())
            .unwrap_or(&[])
    }

    /// Cached record for the selected user, if its detail query settled.
    pub fn selected_user(&self) -> Option<&User> {
        let id = self.selected_id()?;
        self.cache.detail(id).and_then(|entry| entry.data.as_ref())
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected_id()?;
        self.users().iter().position(|u| u.id == id)
    }

    /// Move the list selection, entering `Viewing` for the target row.
    /// Moving with no prior selection selects the first row.
    pub fn move_selection(&mut self, delta: isize) {
        let users = self.users();
        if users.is_empty() {
            return;
        }
        let target = match self.selected_index() {
            Some(idx) => {
                let last = users.len() - 1;
                if delta < 0 {
                    idx.saturating_sub(delta.unsigned_abs())
                } else {
                    (idx + delta.unsigned_abs()).min(last)
                }
            }
            None => 0,
        };
        let id = users[target].id.clone();
        self.selection.select(id);
    }
}

/// Re-export the application event loop entry function.
pub use update::run;
