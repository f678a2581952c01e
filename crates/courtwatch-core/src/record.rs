//! Availability records and the dimensions they are filtered on.
//!
//! A record is an immutable row from the data source. It has no identity
//! beyond its field tuple; duplicates are legal and independent.

use serde::{Deserialize, Serialize};

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// A filter level of the funnel. The declaration order is the funnel order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
  District,
  Venue,
  Date,
  Time,
}

impl Dimension {
  /// All dimensions, upstream first.
  pub const ALL: [Dimension; 4] =
    [Self::District, Self::Venue, Self::Date, Self::Time];

  pub const fn index(self) -> usize {
    match self {
      Self::District => 0,
      Self::Venue => 1,
      Self::Date => 2,
      Self::Time => 3,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::District => "District",
      Self::Venue => "Venue",
      Self::Date => "Date",
      Self::Time => "Time",
    }
  }

  /// The next dimension downstream, if any.
  pub fn next(self) -> Option<Self> { Self::ALL.get(self.index() + 1).copied() }

  /// The previous dimension upstream, if any.
  pub fn prev(self) -> Option<Self> {
    self.index().checked_sub(1).map(|i| Self::ALL[i])
  }

  /// How this level is pre-selected when a session starts.
  pub fn default_policy(self) -> DefaultPolicy {
    match self {
      Self::District => DefaultPolicy::First,
      Self::Venue => DefaultPolicy::Leading { take: 3, max_options: 5 },
      Self::Date => DefaultPolicy::Leading { take: 5, max_options: 10 },
      Self::Time => DefaultPolicy::All,
    }
  }
}

impl std::fmt::Display for Dimension {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// Initial selection rule for one funnel level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultPolicy {
  /// Select the first option only.
  First,
  /// Select the first `take` options when there are at most `max_options`;
  /// otherwise leave the level unrestricted.
  Leading { take: usize, max_options: usize },
  /// Select every option.
  All,
}

impl DefaultPolicy {
  pub fn pick(self, options: &[String]) -> Vec<String> {
    match self {
      Self::First => options.iter().take(1).cloned().collect(),
      Self::Leading { take, max_options } if options.len() <= max_options => {
        options.iter().take(take).cloned().collect()
      }
      Self::Leading { .. } => Vec::new(),
      Self::All => options.to_vec(),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One availability entry.
///
/// Dimension values are optional: a row missing a value is left out of that
/// dimension's option list but still takes part in the others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
  pub district:        Option<String>,
  pub venue:           Option<String>,
  /// ISO date (`YYYY-MM-DD`).
  pub date:            Option<String>,
  /// Session start (`HH:MM`).
  pub start_time:      Option<String>,
  pub available_count: u32,
}

impl Record {
  /// Build a fully-populated record.
  pub fn new(
    district: impl Into<String>,
    venue: impl Into<String>,
    date: impl Into<String>,
    start_time: impl Into<String>,
    available_count: u32,
  ) -> Self {
    Self {
      district: Some(district.into()),
      venue: Some(venue.into()),
      date: Some(date.into()),
      start_time: Some(start_time.into()),
      available_count,
    }
  }

  /// The value this record carries for `dimension`.
  pub fn value(&self, dimension: Dimension) -> Option<&str> {
    match dimension {
      Dimension::District => self.district.as_deref(),
      Dimension::Venue => self.venue.as_deref(),
      Dimension::Date => self.date.as_deref(),
      Dimension::Time => self.start_time.as_deref(),
    }
  }

  pub fn is_available(&self) -> bool { self.available_count > 0 }
}

/// Drop every record without remaining capacity.
pub fn available(records: &[Record]) -> Vec<Record> {
  records.iter().filter(|r| r.is_available()).cloned().collect()
}
