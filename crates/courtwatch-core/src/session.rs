//! Explicit session state handed to every component call.
//!
//! The user-facing controller owns a [`SessionContext`]; the funnel and the
//! monitor only ever read it.

use std::collections::BTreeSet;

use crate::{
  notify::Permission,
  record::{Dimension, Record},
};

// ─── Filter selection ────────────────────────────────────────────────────────

/// The chosen values at each funnel level. An empty level means "no
/// restriction", never "match nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
  levels: [BTreeSet<String>; 4],
}

impl FilterSelection {
  pub fn new() -> Self { Self::default() }

  /// Builder-style setter, mostly useful in tests and config loading.
  pub fn with<I, V>(mut self, dimension: Dimension, values: I) -> Self
  where
    I: IntoIterator<Item = V>,
    V: Into<String>,
  {
    self.set(dimension, values);
    self
  }

  pub fn get(&self, dimension: Dimension) -> &BTreeSet<String> {
    &self.levels[dimension.index()]
  }

  pub fn set<I, V>(&mut self, dimension: Dimension, values: I)
  where
    I: IntoIterator<Item = V>,
    V: Into<String>,
  {
    self.levels[dimension.index()] = values.into_iter().map(Into::into).collect();
  }

  /// Flip membership of `value` at `dimension`. Returns whether the value is
  /// selected afterwards.
  pub fn toggle(&mut self, dimension: Dimension, value: &str) -> bool {
    let level = &mut self.levels[dimension.index()];
    if level.remove(value) {
      false
    } else {
      level.insert(value.to_owned());
      true
    }
  }

  pub fn clear(&mut self, dimension: Dimension) {
    self.levels[dimension.index()].clear();
  }

  pub fn is_selected(&self, dimension: Dimension, value: &str) -> bool {
    self.get(dimension).contains(value)
  }

  /// `true` when no level restricts anything.
  pub fn is_unrestricted(&self) -> bool {
    self.levels.iter().all(BTreeSet::is_empty)
  }

  /// AND of set membership over every non-empty level.
  pub fn matches(&self, record: &Record) -> bool {
    Dimension::ALL.iter().all(|&d| {
      let level = self.get(d);
      level.is_empty() || record.value(d).is_some_and(|v| level.contains(v))
    })
  }
}

// ─── Session context ─────────────────────────────────────────────────────────

/// Everything the user controls, in one place.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
  pub selection:  FilterSelection,
  /// The "live monitor" toggle.
  pub monitoring: bool,
  /// Whether the user has granted the delivery subsystem permission to show
  /// alerts. Granting is a user gesture outside this crate.
  pub permission: Permission,
}

impl SessionContext {
  pub fn new(selection: FilterSelection) -> Self {
    Self { selection, ..Self::default() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn toggle_adds_then_removes() {
    let mut sel = FilterSelection::new();
    assert!(sel.toggle(Dimension::Venue, "V1"));
    assert!(sel.is_selected(Dimension::Venue, "V1"));
    assert!(!sel.toggle(Dimension::Venue, "V1"));
    assert!(sel.is_unrestricted());
  }

  #[test]
  fn empty_levels_pass_everything() {
    let sel = FilterSelection::new().with(Dimension::District, ["A"]);
    assert!(sel.matches(&Record::new("A", "V1", "2024-01-01", "19:00", 1)));
    assert!(!sel.matches(&Record::new("B", "V1", "2024-01-01", "19:00", 1)));
  }

  #[test]
  fn missing_value_fails_a_restricted_level() {
    let mut record = Record::new("A", "V1", "2024-01-01", "19:00", 1);
    record.venue = None;

    assert!(FilterSelection::new().matches(&record));
    assert!(!FilterSelection::new().with(Dimension::Venue, ["V1"]).matches(&record));
  }
}
