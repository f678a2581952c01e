//! TUI state and key dispatch.
//!
//! The app owns the user's [`FilterSelection`]; every change is sent to the
//! monitor task, and the corrected selection comes back with the next update.

use chrono::{DateTime, Utc};
use courtwatch_core::{
  funnel::FunnelResult,
  monitor::DataState,
  notify::{Alert, Permission},
  record::Dimension,
  session::FilterSelection,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::driver::{Command, Outcome, Update};

// ─── View ─────────────────────────────────────────────────────────────────────

/// The most recent funnel output and what it was computed from.
#[derive(Debug, Clone)]
pub struct View {
  pub funnel:     FunnelResult,
  /// `None` when the funnel ran over stale fallback data.
  pub data:       Option<DataState>,
  pub checked_at: Option<DateTime<Utc>>,
  pub fetched_at: Option<DateTime<Utc>>,
}

impl View {
  pub fn is_stale(&self) -> bool { self.data.is_none() }
}

/// What the event loop should do after a key press.
#[derive(Debug, PartialEq)]
pub enum Action {
  None,
  Send(Command),
  Quit,
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App {
  pub selection:  FilterSelection,
  /// Bumped on every local selection change.
  pub revision:   u64,
  /// The filter level with keyboard focus.
  pub focus:      Dimension,
  /// Cursor per level, into that level's option list.
  pub cursors:    [usize; 4],
  pub view:       Option<View>,
  pub monitoring: bool,
  pub permission: Permission,
  /// Transient fetch problem, cleared by the next good update.
  pub warning:    Option<String>,
  pub last_alert: Option<(DateTime<Utc>, Alert)>,
  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl App {
  pub fn new(selection: FilterSelection, permission: Permission) -> Self {
    Self {
      selection,
      revision: 0,
      focus: Dimension::District,
      cursors: [0; 4],
      view: None,
      monitoring: false,
      permission,
      warning: None,
      last_alert: None,
      status_msg: "Loading availability…".into(),
    }
  }

  pub fn options(&self, dimension: Dimension) -> &[String] {
    self.view.as_ref().map(|v| v.funnel.options(dimension)).unwrap_or_default()
  }

  // ── Updates from the monitor task ─────────────────────────────────────────

  pub fn apply_update(&mut self, update: Update) {
    if update.revision == self.revision {
      self.selection = update.selection;
    }

    match update.outcome {
      Outcome::Evaluated(report) => {
        self.warning = None;
        self.monitoring = report.active;
        if let Some(alert) = report.alert {
          self.status_msg = format!("{} {}", alert.title, alert.body);
          self.last_alert = Some((report.checked_at, alert));
        } else {
          self.status_msg = match report.data {
            DataState::Empty => "No data loaded from the source.".into(),
            DataState::NoAvailability => {
              "No courts with availability at the moment.".into()
            }
            DataState::Loaded => String::new(),
          };
        }
        self.view = Some(View {
          funnel:     report.funnel,
          data:       Some(report.data),
          checked_at: Some(report.checked_at),
          fetched_at: report.fetched_at,
        });
      }
      Outcome::Failed { error, fallback, active } => {
        self.monitoring = active;
        self.warning = Some(error);
        if let Some(funnel) = fallback {
          let (checked_at, fetched_at) = self
            .view
            .as_ref()
            .map(|v| (v.checked_at, v.fetched_at))
            .unwrap_or_default();
          self.view = Some(View { funnel, data: None, checked_at, fetched_at });
        }
      }
    }

    self.clamp_cursors();
  }

  fn clamp_cursors(&mut self) {
    for d in Dimension::ALL {
      let len = self.options(d).len();
      let cursor = &mut self.cursors[d.index()];
      *cursor = (*cursor).min(len.saturating_sub(1));
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  pub fn handle_key(&mut self, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Action::Quit;
    }

    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => Action::Quit,

      // Level focus
      KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
        self.focus = self.focus.next().unwrap_or(Dimension::District);
        Action::None
      }
      KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
        self.focus = self.focus.prev().unwrap_or(Dimension::Time);
        Action::None
      }

      // Option cursor
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.options(self.focus).len();
        let cursor = &mut self.cursors[self.focus.index()];
        if *cursor + 1 < len {
          *cursor += 1;
        }
        Action::None
      }
      KeyCode::Up | KeyCode::Char('k') => {
        let cursor = &mut self.cursors[self.focus.index()];
        *cursor = cursor.saturating_sub(1);
        Action::None
      }

      // Selection
      KeyCode::Char(' ') | KeyCode::Enter => {
        let cursor = self.cursors[self.focus.index()];
        let Some(value) = self.options(self.focus).get(cursor).cloned() else {
          return Action::None;
        };
        self.selection.toggle(self.focus, &value);
        self.selection_changed()
      }
      KeyCode::Char('a') => {
        if self.selection.get(self.focus).is_empty() {
          let all = self.options(self.focus).to_vec();
          self.selection.set(self.focus, all);
        } else {
          self.selection.clear(self.focus);
        }
        self.selection_changed()
      }

      // Monitor / refresh / permission
      KeyCode::Char('m') => {
        self.monitoring = !self.monitoring;
        self.status_msg = if self.monitoring {
          "Live monitor on.".into()
        } else {
          "Live monitor off.".into()
        };
        Action::Send(Command::SetMonitoring(self.monitoring))
      }
      KeyCode::Char('r') => {
        self.status_msg = "Refreshing…".into();
        Action::Send(Command::Refresh)
      }
      KeyCode::Char('n') => {
        if self.permission.is_granted() {
          self.status_msg = "Notifications already allowed.".into();
          Action::None
        } else {
          self.permission = Permission::Granted;
          self.status_msg = "Notifications allowed.".into();
          Action::Send(Command::GrantNotifications)
        }
      }

      _ => Action::None,
    }
  }

  fn selection_changed(&mut self) -> Action {
    self.revision += 1;
    Action::Send(Command::SetSelection {
      selection: self.selection.clone(),
      revision:  self.revision,
    })
  }
}
