//! The availability monitor: one evaluation per tick, edge-triggered alerts.
//!
//! The monitor is either INACTIVE (`session == None`) or ACTIVE with a
//! [`MonitorState`] that lives until it is disabled. Every tick fetches
//! through the [`CacheStore`], runs the funnel, and (only while ACTIVE)
//! consults the gate. All state changes happen after the fetch has
//! completed, so a tick whose future is dropped mid-fetch leaves the monitor
//! exactly as it was.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Result,
  cache::CacheStore,
  clock::{Clock, SystemClock},
  funnel::{self, FunnelResult},
  gate::{self, MonitorState},
  notify::{Alert, Delivery, Notifier},
  record::{self, Dimension, Record},
  session::{FilterSelection, SessionContext},
  source::DataSource,
};

/// What the fetched dataset looked like before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataState {
  /// At least one row has remaining capacity.
  Loaded,
  /// Rows were returned but none has capacity.
  NoAvailability,
  /// The source returned nothing at all.
  Empty,
}

/// The outcome of one successful evaluation.
#[derive(Debug, Clone)]
pub struct TickReport {
  pub funnel:        FunnelResult,
  pub data:          DataState,
  pub current_match: bool,
  /// The alert raised on this tick, if the gate fired.
  pub alert:         Option<Alert>,
  /// Whether `alert` was handed to the notifier (permission granted).
  pub delivered:     bool,
  pub checked_at:    DateTime<Utc>,
  pub fetched_at:    Option<DateTime<Utc>>,
  /// Whether the monitor was ACTIVE for this evaluation.
  pub active:        bool,
}

struct Session {
  id:    Uuid,
  state: MonitorState,
}

pub struct AvailabilityMonitor<S, C = SystemClock> {
  cache:    CacheStore<S, C>,
  notifier: Arc<dyn Notifier>,
  session:  Option<Session>,
}

impl<S: DataSource, C: Clock> AvailabilityMonitor<S, C> {
  pub fn new(cache: CacheStore<S, C>, notifier: Arc<dyn Notifier>) -> Self {
    Self { cache, notifier, session: None }
  }

  // ── State machine ─────────────────────────────────────────────────────

  pub fn is_active(&self) -> bool { self.session.is_some() }

  /// INACTIVE → ACTIVE with a fresh [`MonitorState`]. No-op when already
  /// active.
  pub fn enable(&mut self) {
    if self.session.is_none() {
      let id = Uuid::new_v4();
      tracing::info!(session = %id, "live monitor enabled");
      self.session = Some(Session { id, state: MonitorState::default() });
    }
  }

  /// ACTIVE → INACTIVE; the session state is discarded.
  pub fn disable(&mut self) {
    if let Some(session) = self.session.take() {
      tracing::info!(session = %session.id, "live monitor disabled");
    }
  }

  pub fn set_active(&mut self, active: bool) {
    if active { self.enable() } else { self.disable() }
  }

  /// A selection change may define a new target: re-arm the gate so the
  /// next matching tick notifies even if a match was already showing.
  pub fn on_selection_changed(&mut self) {
    if let Some(session) = self.session.as_mut() {
      tracing::debug!(session = %session.id, "selection changed, re-arming");
      session.state = MonitorState::default();
    }
  }

  /// Drop the cache freshness so the next tick refetches.
  pub fn refresh(&mut self) { self.cache.invalidate(); }

  /// Current session state, `None` while INACTIVE.
  pub fn state(&self) -> Option<&MonitorState> {
    self.session.as_ref().map(|s| &s.state)
  }

  // ── Evaluation ────────────────────────────────────────────────────────

  /// Run one fetch → filter → gate cycle.
  ///
  /// Once the fetch has completed, the monitor's ACTIVE flag is brought in
  /// line with `ctx.monitoring`. On a fetch failure the error is returned and
  /// neither the flag nor the session state changes.
  pub async fn tick(&mut self, ctx: &SessionContext) -> Result<TickReport> {
    let raw = match self.cache.get().await {
      Ok(raw) => raw,
      Err(e) => {
        tracing::warn!(error = %e, "tick skipped");
        return Err(e);
      }
    };
    self.set_active(ctx.monitoring);

    let available = record::available(&raw);
    let data = classify(&raw, &available);
    let funnel = funnel::compute(&available, &ctx.selection);
    let current_match = funnel.is_match();
    let checked_at = self.cache.clock().now();

    let mut alert = None;
    let mut delivered = false;
    if let Some(session) = self.session.as_mut() {
      session.state.last_checked_at = Some(checked_at);
      let decision = gate::evaluate(current_match, &funnel.filtered, &session.state);
      session.state = decision.state;

      if let Some(fired) = decision.alert {
        if ctx.permission.is_granted() {
          let outcome = self.notifier.notify(&fired);
          tracing::info!(
            session = %session.id,
            venue = %fired.venue,
            matches = fired.matches,
            ?outcome,
            "match found, alert sent"
          );
          delivered = outcome == Delivery::Shown;
        } else {
          tracing::info!(
            session = %session.id,
            venue = %fired.venue,
            "match found, notifications not permitted"
          );
        }
        alert = Some(fired);
      }
    }

    tracing::debug!(
      rows = raw.len(),
      available = available.len(),
      matches = funnel.filtered.len(),
      "tick complete"
    );

    Ok(TickReport {
      funnel,
      data,
      current_match,
      alert,
      delivered,
      checked_at,
      fetched_at: self.cache.fetched_at(),
      active: self.session.is_some(),
    })
  }

  /// Funnel over the last successful fetch, for display while the source is
  /// unreachable. Never touches the gate.
  pub fn fallback(&self, selection: &FilterSelection) -> Option<FunnelResult> {
    let raw = self.cache.last_good()?;
    Some(funnel::compute(&record::available(&raw), selection))
  }

  /// Fetch (through the cache) and build the session's initial selection.
  ///
  /// `None` while nothing is available: defaults picked from an empty
  /// dataset would be empty, and would stick.
  pub async fn default_selection(
    &mut self,
    overrides: &FilterSelection,
  ) -> Result<Option<FilterSelection>> {
    let available = self.available().await?;
    Ok(
      (!available.is_empty())
        .then(|| funnel::default_selection(&available, overrides)),
    )
  }

  /// Fetch (through the cache) and drop choices below `edited` that the
  /// user's edit left dangling. `None` while nothing is available.
  pub async fn reconcile(
    &mut self,
    selection: &FilterSelection,
    edited: Dimension,
  ) -> Result<Option<FilterSelection>> {
    let available = self.available().await?;
    Ok(
      (!available.is_empty())
        .then(|| funnel::reconcile(&available, selection, edited)),
    )
  }

  async fn available(&mut self) -> Result<Vec<Record>> {
    let raw = self.cache.get().await?;
    Ok(record::available(&raw))
  }

  pub fn cache(&self) -> &CacheStore<S, C> { &self.cache }
}

fn classify(raw: &[Record], available: &[Record]) -> DataState {
  if raw.is_empty() {
    DataState::Empty
  } else if available.is_empty() {
    DataState::NoAvailability
  } else {
    DataState::Loaded
  }
}
