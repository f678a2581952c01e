//! Edge-triggered notification gate.
//!
//! The gate turns a per-tick "is there a match" signal into at most one alert
//! per continuous run of matching ticks. It fires only on the rising edge
//! (`false` → `true`); a run that stays `true` is silent until it drops back
//! to `false` or the state is reset by a selection change.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::{notify::Alert, record::Record};

/// Per-session monitor memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
  pub last_match:      bool,
  pub last_checked_at: Option<DateTime<Utc>>,
  /// The match set the last alert was raised for.
  pub notified_for:    Option<Fingerprint>,
}

/// Stable digest of a set of matched records (SHA-256, hex).
///
/// Order-insensitive: the same rows in any order give the same fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
  pub fn of(records: &[Record]) -> Self {
    let mut keys: Vec<[&str; 4]> = records
      .iter()
      .map(|r| {
        [
          r.district.as_deref().unwrap_or_default(),
          r.venue.as_deref().unwrap_or_default(),
          r.date.as_deref().unwrap_or_default(),
          r.start_time.as_deref().unwrap_or_default(),
        ]
      })
      .collect();
    keys.sort_unstable();

    let mut hasher = Sha256::new();
    for key in &keys {
      for field in key {
        hasher.update(field.as_bytes());
        hasher.update([0x1f_u8]);
      }
      hasher.update([0x1e_u8]);
    }
    Self(hex::encode(hasher.finalize()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Output of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
  /// `Some` exactly when the gate fires.
  pub alert: Option<Alert>,
  pub state: MonitorState,
}

impl GateDecision {
  pub fn notify(&self) -> bool { self.alert.is_some() }
}

/// Decide whether this observation warrants an alert.
pub fn evaluate(
  current_match: bool,
  matched: &[Record],
  state: &MonitorState,
) -> GateDecision {
  let rising = current_match && !state.last_match;

  let alert = rising.then(|| build_alert(matched));
  let notified_for = match (&alert, current_match) {
    (Some(alert), _) => Some(alert.fingerprint.clone()),
    (None, true) => state.notified_for.clone(),
    (None, false) => None,
  };

  GateDecision {
    alert,
    state: MonitorState {
      last_match: current_match,
      last_checked_at: state.last_checked_at,
      notified_for,
    },
  }
}

fn build_alert(matched: &[Record]) -> Alert {
  let venue = matched
    .iter()
    .find_map(|r| r.venue.clone())
    .unwrap_or_else(|| "Court".to_owned());
  Alert {
    title: "Court Found!".to_owned(),
    body: format!("Go book at {venue} now!"),
    venue,
    matches: matched.len(),
    fingerprint: Fingerprint::of(matched),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn matched() -> Vec<Record> {
    vec![
      Record::new("A", "Victoria Park", "2024-01-01", "19:00", 2),
      Record::new("A", "Quarry Bay", "2024-01-01", "20:00", 1),
    ]
  }

  #[test]
  fn fires_only_on_rising_edges() {
    let rows = matched();
    let mut state = MonitorState::default();
    let mut fired = Vec::new();

    for (tick, current) in [false, true, true, false, true].into_iter().enumerate() {
      let slice: &[Record] = if current { &rows } else { &[] };
      let decision = evaluate(current, slice, &state);
      if decision.notify() {
        fired.push(tick + 1);
      }
      state = decision.state;
    }

    assert_eq!(fired, [2, 5]);
  }

  #[test]
  fn alert_names_first_venue() {
    let decision = evaluate(true, &matched(), &MonitorState::default());
    let alert = decision.alert.unwrap();
    assert_eq!(alert.venue, "Victoria Park");
    assert_eq!(alert.body, "Go book at Victoria Park now!");
    assert_eq!(alert.matches, 2);
    assert_eq!(decision.state.notified_for, Some(alert.fingerprint));
  }

  #[test]
  fn missing_venue_falls_back_to_court() {
    let mut row = Record::new("A", "x", "2024-01-01", "19:00", 1);
    row.venue = None;
    let alert = evaluate(true, &[row], &MonitorState::default()).alert.unwrap();
    assert_eq!(alert.body, "Go book at Court now!");
  }

  #[test]
  fn falling_edge_clears_fingerprint() {
    let first = evaluate(true, &matched(), &MonitorState::default());
    let held = evaluate(true, &matched(), &first.state);
    assert!(!held.notify());
    assert!(held.state.notified_for.is_some());

    let dropped = evaluate(false, &[], &held.state);
    assert_eq!(dropped.state.notified_for, None);
    assert!(!dropped.state.last_match);
  }

  #[test]
  fn checked_at_is_carried_through() {
    let at = Utc::now();
    let state = MonitorState { last_checked_at: Some(at), ..MonitorState::default() };
    assert_eq!(evaluate(false, &[], &state).state.last_checked_at, Some(at));
  }

  #[test]
  fn fingerprint_ignores_order() {
    let mut reversed = matched();
    reversed.reverse();
    assert_eq!(Fingerprint::of(&matched()), Fingerprint::of(&reversed));
    assert_ne!(Fingerprint::of(&matched()), Fingerprint::of(&matched()[..1]));
    assert_eq!(Fingerprint::of(&[]).as_str().len(), 64);
  }
}
