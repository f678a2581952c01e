//! The cascading filter funnel.
//!
//! Levels are processed upstream first. Each level's options are the distinct
//! values present in the scope left by the levels above it, and each level's
//! selection is corrected against those options before it narrows the scope
//! further. A level whose every choice has disappeared matches nothing: a
//! booked-out target is a miss, not a reason to widen the search.

use std::collections::BTreeSet;

use crate::{
  record::{Dimension, Record},
  session::FilterSelection,
};

/// Output of [`compute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunnelResult {
  /// Valid options per level, ascending.
  pub options:   [Vec<String>; 4],
  /// The input selection with every invalid choice removed.
  pub selection: FilterSelection,
  /// Records passing every level's selection, in source order.
  pub filtered:  Vec<Record>,
}

impl FunnelResult {
  pub fn options(&self, dimension: Dimension) -> &[String] {
    &self.options[dimension.index()]
  }

  pub fn is_match(&self) -> bool { !self.filtered.is_empty() }
}

/// Run `records` (already restricted to available rows) through the funnel.
pub fn compute(records: &[Record], selection: &FilterSelection) -> FunnelResult {
  let mut scope: Vec<&Record> = records.iter().collect();
  let mut result = FunnelResult::default();

  for dimension in Dimension::ALL {
    let options = distinct(&scope, dimension);
    let requested = selection.get(dimension);
    let chosen: BTreeSet<String> = requested
      .iter()
      .filter(|v| options.contains(v.as_str()))
      .cloned()
      .collect();

    if !requested.is_empty() {
      scope.retain(|r| r.value(dimension).is_some_and(|v| chosen.contains(v)));
    }

    result.options[dimension.index()] =
      options.into_iter().map(str::to_owned).collect();
    result.selection.set(dimension, chosen);
  }

  result.filtered = scope.into_iter().cloned().collect();
  result
}

/// Build the initial selection for a session.
///
/// Levels with a non-empty entry in `overrides` keep it verbatim, so a
/// configured target that is currently booked out is still watched. The
/// rest follow [`Dimension::default_policy`]. Each level is evaluated against
/// the scope narrowed by the levels above it.
pub fn default_selection(
  records: &[Record],
  overrides: &FilterSelection,
) -> FilterSelection {
  let mut scope: Vec<&Record> = records.iter().collect();
  let mut selection = FilterSelection::new();

  for dimension in Dimension::ALL {
    let options: Vec<String> = distinct(&scope, dimension)
      .into_iter()
      .map(str::to_owned)
      .collect();

    let requested = overrides.get(dimension);
    let chosen: BTreeSet<String> = if requested.is_empty() {
      dimension.default_policy().pick(&options).into_iter().collect()
    } else {
      for missing in requested.iter().filter(|v| !options.contains(v)) {
        tracing::warn!(
          level = %dimension,
          value = %missing,
          "configured choice has no available slots"
        );
      }
      requested.clone()
    };

    if !chosen.is_empty() {
      scope.retain(|r| r.value(dimension).is_some_and(|v| chosen.contains(v)));
    }
    selection.set(dimension, chosen);
  }

  selection
}

/// Drop choices strictly below `edited` that are no longer options once the
/// user's edit at `edited` has narrowed the scope. Levels at or above
/// `edited` are kept as the user left them.
pub fn reconcile(
  records: &[Record],
  selection: &FilterSelection,
  edited: Dimension,
) -> FilterSelection {
  let mut scope: Vec<&Record> = records.iter().collect();
  let mut reconciled = FilterSelection::new();

  for dimension in Dimension::ALL {
    let options = distinct(&scope, dimension);
    let requested = selection.get(dimension);
    let chosen: BTreeSet<String> = if dimension > edited {
      requested
        .iter()
        .filter(|v| options.contains(v.as_str()))
        .cloned()
        .collect()
    } else {
      requested.clone()
    };

    if !chosen.is_empty() {
      scope.retain(|r| r.value(dimension).is_some_and(|v| chosen.contains(v)));
    }
    reconciled.set(dimension, chosen);
  }

  reconciled
}

fn distinct<'a>(scope: &[&'a Record], dimension: Dimension) -> BTreeSet<&'a str> {
  scope.iter().copied().filter_map(|r| r.value(dimension)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::available;

  fn rows() -> Vec<Record> {
    vec![
      Record::new("Central", "Victoria Park", "2024-01-02", "19:00", 2),
      Record::new("Central", "Victoria Park", "2024-01-01", "20:00", 1),
      Record::new("Central", "Harbour Road", "2024-01-01", "07:00", 3),
      Record::new("Eastern", "Quarry Bay", "2024-01-03", "19:00", 1),
      Record::new("Eastern", "Quarry Bay", "2024-01-03", "21:00", 4),
    ]
  }

  #[test]
  fn options_are_sorted_and_distinct() {
    let result = compute(&rows(), &FilterSelection::new());
    assert_eq!(result.options(Dimension::District), ["Central", "Eastern"]);
    assert_eq!(
      result.options(Dimension::Date),
      ["2024-01-01", "2024-01-02", "2024-01-03"]
    );
    assert_eq!(result.options(Dimension::Time), ["07:00", "19:00", "20:00", "21:00"]);
    assert_eq!(result.filtered.len(), 5);
  }

  #[test]
  fn upstream_choice_narrows_downstream_options() {
    let sel = FilterSelection::new().with(Dimension::District, ["Eastern"]);
    let result = compute(&rows(), &sel);
    assert_eq!(result.options(Dimension::District), ["Central", "Eastern"]);
    assert_eq!(result.options(Dimension::Venue), ["Quarry Bay"]);
    assert_eq!(result.options(Dimension::Time), ["19:00", "21:00"]);
    assert_eq!(result.filtered.len(), 2);
  }

  #[test]
  fn dangling_downstream_choice_is_dropped() {
    let sel = FilterSelection::new()
      .with(Dimension::District, ["Eastern"])
      .with(Dimension::Venue, ["Victoria Park", "Quarry Bay"]);
    let result = compute(&rows(), &sel);

    let venues: Vec<_> = result.selection.get(Dimension::Venue).iter().collect();
    assert_eq!(venues, ["Quarry Bay"]);
    assert!(result.filtered.iter().all(|r| r.venue.as_deref() == Some("Quarry Bay")));
  }

  #[test]
  fn fully_invalid_choice_matches_nothing() {
    let sel = FilterSelection::new()
      .with(Dimension::District, ["Eastern"])
      .with(Dimension::Venue, ["Victoria Park"]);
    let result = compute(&rows(), &sel);

    assert!(result.selection.get(Dimension::Venue).is_empty());
    assert_eq!(result.options(Dimension::Venue), ["Quarry Bay"]);
    assert!(result.options(Dimension::Date).is_empty());
    assert!(!result.is_match());
  }

  #[test]
  fn booked_out_target_is_a_miss_until_it_reopens() {
    let sel = FilterSelection::new()
      .with(Dimension::District, ["Central"])
      .with(Dimension::Venue, ["Victoria Park"]);
    let mut records = rows();

    records.retain(|r| r.venue.as_deref() != Some("Victoria Park"));
    assert!(!compute(&records, &sel).is_match());

    let reopened = compute(&rows(), &sel);
    assert_eq!(reopened.filtered.len(), 2);
  }

  #[test]
  fn every_corrected_choice_is_an_option() {
    let sel = FilterSelection::new()
      .with(Dimension::District, ["Central", "Nowhere"])
      .with(Dimension::Venue, ["Harbour Road", "Quarry Bay"])
      .with(Dimension::Date, ["2024-01-02", "2024-01-01"])
      .with(Dimension::Time, ["07:00", "19:00"]);
    let result = compute(&rows(), &sel);

    for d in Dimension::ALL {
      for chosen in result.selection.get(d) {
        assert!(result.options(d).contains(chosen), "{d}: {chosen}");
      }
    }
    assert_eq!(result.filtered.len(), 1);
    assert_eq!(result.filtered[0].start_time.as_deref(), Some("07:00"));
  }

  #[test]
  fn empty_level_equals_selecting_all_options() {
    let base = FilterSelection::new().with(Dimension::District, ["Central"]);
    let open = compute(&rows(), &base);

    let all_venues = open.options(Dimension::Venue).to_vec();
    let explicit = compute(&rows(), &base.clone().with(Dimension::Venue, all_venues));

    assert_eq!(open.filtered, explicit.filtered);
  }

  #[test]
  fn missing_values_stay_out_of_options_only() {
    let mut partial = Record::new("Central", "Victoria Park", "2024-01-05", "19:00", 1);
    partial.venue = None;
    let mut records = rows();
    records.push(partial);

    let result = compute(&records, &FilterSelection::new());
    assert!(!result.options(Dimension::Venue).iter().any(String::is_empty));
    assert_eq!(result.options(Dimension::Venue).len(), 3);
    assert!(result.options(Dimension::Date).contains(&"2024-01-05".to_string()));
    assert_eq!(result.filtered.len(), 6);
  }

  #[test]
  fn zero_capacity_row_is_not_a_match() {
    let raw = vec![
      Record::new("A", "V1", "2024-01-01", "19:00", 2),
      Record::new("A", "V2", "2024-01-01", "20:00", 0),
    ];
    let sel = FilterSelection::new().with(Dimension::District, ["A"]);
    let result = compute(&available(&raw), &sel);

    assert_eq!(result.filtered, vec![raw[0].clone()]);
  }

  #[test]
  fn empty_input_is_not_an_error() {
    let result = compute(&[], &FilterSelection::new().with(Dimension::District, ["A"]));
    assert!(result.options.iter().all(Vec::is_empty));
    assert!(result.filtered.is_empty());
    assert!(!result.is_match());
  }

  #[test]
  fn duplicates_are_kept() {
    let row = Record::new("A", "V1", "2024-01-01", "19:00", 1);
    let result = compute(&[row.clone(), row], &FilterSelection::new());
    assert_eq!(result.filtered.len(), 2);
    assert_eq!(result.options(Dimension::Venue), ["V1"]);
  }

  #[test]
  fn defaults_follow_level_policies() {
    let sel = default_selection(&rows(), &FilterSelection::new());
    let district: Vec<_> = sel.get(Dimension::District).iter().collect();
    assert_eq!(district, ["Central"]);
    // Two venues in Central: few enough to pre-select.
    assert_eq!(sel.get(Dimension::Venue).len(), 2);
    assert_eq!(sel.get(Dimension::Date).len(), 2);
    let times: Vec<_> = sel.get(Dimension::Time).iter().collect();
    assert_eq!(times, ["07:00", "19:00", "20:00"]);
  }

  #[test]
  fn defaults_leave_crowded_levels_open() {
    let records: Vec<Record> = (0..8)
      .map(|i| Record::new("A", format!("Venue {i}"), "2024-01-01", "19:00", 1))
      .collect();
    let sel = default_selection(&records, &FilterSelection::new());
    assert!(sel.get(Dimension::Venue).is_empty());
  }

  #[test]
  fn overrides_win_over_policy() {
    let overrides = FilterSelection::new().with(Dimension::District, ["Eastern", "Gone"]);
    let sel = default_selection(&rows(), &overrides);
    let district: Vec<_> = sel.get(Dimension::District).iter().collect();
    assert_eq!(district, ["Eastern", "Gone"]);
    let venues: Vec<_> = sel.get(Dimension::Venue).iter().collect();
    assert_eq!(venues, ["Quarry Bay"]);
  }

  #[test]
  fn unknown_override_is_watched_not_widened() {
    let overrides = FilterSelection::new().with(Dimension::District, ["Wan Chai"]);
    let sel = default_selection(&rows(), &overrides);

    assert!(sel.is_selected(Dimension::District, "Wan Chai"));
    assert!(sel.get(Dimension::Venue).is_empty());
    assert!(!compute(&rows(), &sel).is_match());
  }

  #[test]
  fn reconcile_drops_choices_left_behind_by_an_upstream_edit() {
    let sel = FilterSelection::new()
      .with(Dimension::District, ["Eastern"])
      .with(Dimension::Venue, ["Victoria Park"])
      .with(Dimension::Time, ["19:00"]);
    let reconciled = reconcile(&rows(), &sel, Dimension::District);

    assert!(reconciled.is_selected(Dimension::District, "Eastern"));
    assert!(reconciled.get(Dimension::Venue).is_empty());
    assert!(reconciled.is_selected(Dimension::Time, "19:00"));
    assert_eq!(compute(&rows(), &reconciled).filtered.len(), 1);
  }

  #[test]
  fn reconcile_keeps_the_edited_level_and_above() {
    let sel = FilterSelection::new()
      .with(Dimension::District, ["Central"])
      .with(Dimension::Venue, ["Gone"]);
    let reconciled = reconcile(&rows(), &sel, Dimension::Venue);
    assert_eq!(reconciled, sel);
  }
}
