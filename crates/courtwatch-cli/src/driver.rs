//! The monitor task.
//!
//! One tokio task owns the [`AvailabilityMonitor`] and the
//! [`SessionContext`]. Front ends talk to it through two channels: commands
//! in, updates out. Evaluations never overlap. A command that arrives while
//! a tick is waiting on the network abandons that tick (its future is
//! dropped, so nothing it would have changed is applied) and is handled
//! before the next evaluation starts.

use std::{ops::ControlFlow, time::Duration};

use courtwatch_core::{
  clock::Clock,
  funnel::FunnelResult,
  monitor::{AvailabilityMonitor, TickReport},
  notify::Permission,
  record::Dimension,
  session::{FilterSelection, SessionContext},
  source::DataSource,
};
use tokio::{sync::mpsc, time::MissedTickBehavior};

// ─── Messages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  /// The user changed a filter. `revision` lets the front end recognise
  /// updates computed for its latest selection.
  SetSelection { selection: FilterSelection, revision: u64 },
  SetMonitoring(bool),
  /// Bypass the cache on the next fetch.
  Refresh,
  GrantNotifications,
  Shutdown,
}

#[derive(Debug, Clone)]
pub enum Outcome {
  Evaluated(TickReport),
  Failed {
    error:    String,
    /// Funnel over the last good data, if there is any.
    fallback: Option<FunnelResult>,
    active:   bool,
  },
}

#[derive(Debug, Clone)]
pub struct Update {
  pub revision:  u64,
  /// The selection in force for this evaluation. It is the user's own
  /// choice, trimmed only where an upstream edit left downstream choices
  /// dangling. Data churn never changes it.
  pub selection: FilterSelection,
  pub outcome:   Outcome,
}

// ─── Driver ───────────────────────────────────────────────────────────────────

pub struct Driver<S, C> {
  monitor:  AvailabilityMonitor<S, C>,
  ctx:      SessionContext,
  revision: u64,
  /// Whether the default selection policy has been applied.
  primed:   bool,
  /// Most upstream level the user edited since the last reconcile.
  edited:   Option<Dimension>,
}

impl<S: DataSource, C: Clock> Driver<S, C> {
  pub fn new(monitor: AvailabilityMonitor<S, C>, ctx: SessionContext) -> Self {
    Self { monitor, ctx, revision: 0, primed: false, edited: None }
  }

  /// Apply a command. `Break` stops the task.
  pub fn apply(&mut self, command: Command) -> ControlFlow<()> {
    match command {
      Command::SetSelection { selection, revision } => {
        if let Some(level) = first_difference(&self.ctx.selection, &selection) {
          self.edited = Some(self.edited.map_or(level, |e| e.min(level)));
        }
        self.ctx.selection = selection;
        self.revision = revision;
        self.primed = true;
        self.monitor.on_selection_changed();
      }
      Command::SetMonitoring(on) => {
        self.ctx.monitoring = on;
        self.monitor.set_active(on);
      }
      Command::Refresh => self.monitor.refresh(),
      Command::GrantNotifications => {
        tracing::info!("notification permission granted");
        self.ctx.permission = Permission::Granted;
      }
      Command::Shutdown => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
  }

  /// Prepare the selection if needed, then tick once.
  pub async fn evaluate(&mut self) -> Update {
    if let Err(e) = self.prepare().await {
      return self.failed(e);
    }

    match self.monitor.tick(&self.ctx).await {
      Ok(report) => self.update(Outcome::Evaluated(report)),
      Err(e) => self.failed(e),
    }
  }

  /// Apply the default policy once data is available, or trim choices left
  /// dangling by the user's last upstream edit. Both wait for a dataset with
  /// availability, so an empty fetch never empties the selection.
  async fn prepare(&mut self) -> courtwatch_core::Result<()> {
    if !self.primed {
      if let Some(selection) = self.monitor.default_selection(&self.ctx.selection).await? {
        tracing::info!(?selection, "default selection applied");
        self.ctx.selection = selection;
        self.primed = true;
      }
    } else if let Some(edited) = self.edited
      && let Some(selection) = self.monitor.reconcile(&self.ctx.selection, edited).await?
    {
      self.ctx.selection = selection;
      self.edited = None;
    }
    Ok(())
  }

  fn failed(&self, error: courtwatch_core::Error) -> Update {
    self.update(Outcome::Failed {
      error:    error.to_string(),
      fallback: self.monitor.fallback(&self.ctx.selection),
      active:   self.monitor.is_active(),
    })
  }

  fn update(&self, outcome: Outcome) -> Update {
    Update { revision: self.revision, selection: self.ctx.selection.clone(), outcome }
  }
}

fn first_difference(old: &FilterSelection, new: &FilterSelection) -> Option<Dimension> {
  Dimension::ALL.into_iter().find(|&d| old.get(d) != new.get(d))
}

// ─── Task loop ────────────────────────────────────────────────────────────────

enum Step {
  Command(Option<Command>),
  Evaluated(Update),
}

/// Run until [`Command::Shutdown`], or until either channel closes.
///
/// Evaluates once at start, after every command, and every `poll` while
/// monitoring is enabled.
pub async fn run<S: DataSource, C: Clock>(
  mut driver: Driver<S, C>,
  poll: Duration,
  mut commands: mpsc::Receiver<Command>,
  updates: mpsc::Sender<Update>,
) {
  let mut ticker = tokio::time::interval(poll);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
  let mut due = true;

  loop {
    if due {
      due = false;
      let step = tokio::select! {
        biased;
        command = commands.recv() => Step::Command(command),
        update = driver.evaluate() => Step::Evaluated(update),
      };

      match step {
        Step::Evaluated(update) => {
          ticker.reset();
          if updates.send(update).await.is_err() {
            break;
          }
        }
        Step::Command(Some(command)) => {
          tracing::debug!(?command, "evaluation abandoned for incoming command");
          if driver.apply(command).is_break() {
            break;
          }
          due = true;
        }
        Step::Command(None) => break,
      }
      continue;
    }

    let monitoring = driver.ctx.monitoring;
    let step = tokio::select! {
      command = commands.recv() => Some(command),
      _ = ticker.tick(), if monitoring => None,
    };
    match step {
      Some(Some(command)) => {
        if driver.apply(command).is_break() {
          break;
        }
        due = true;
      }
      Some(None) => break,
      None => due = true,
    }
  }

  tracing::debug!("monitor task stopped");
}
