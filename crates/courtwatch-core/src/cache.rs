//! Time-to-live cache in front of a [`DataSource`].
//!
//! Staleness up to the TTL is accepted; the TTL bounds load on the source,
//! not correctness. Failures are never cached.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
  Error, Result,
  clock::{Clock, SystemClock},
  record::Record,
  source::DataSource,
};

/// The last successful fetch.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub value:      Arc<Vec<Record>>,
  pub fetched_at: DateTime<Utc>,
  pub ttl:        TimeDelta,
}

impl CacheEntry {
  pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
    now - self.fetched_at < self.ttl
  }
}

pub struct CacheStore<S, C = SystemClock> {
  source:      S,
  clock:       C,
  ttl:         TimeDelta,
  entry:       Option<CacheEntry>,
  /// Set by [`CacheStore::invalidate`]; the entry is kept for fallback only.
  invalidated: bool,
}

impl<S: DataSource> CacheStore<S> {
  pub fn new(source: S, ttl: Duration) -> Self {
    Self::with_clock(source, ttl, SystemClock)
  }
}

impl<S: DataSource, C: Clock> CacheStore<S, C> {
  pub fn with_clock(source: S, ttl: Duration, clock: C) -> Self {
    Self {
      source,
      clock,
      ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
      entry: None,
      invalidated: false,
    }
  }

  /// Return the cached records while fresh, otherwise fetch.
  ///
  /// A failed fetch leaves the previous entry (if any) in place but does not
  /// extend it; the next call fetches again.
  pub async fn get(&mut self) -> Result<Arc<Vec<Record>>> {
    let now = self.clock.now();
    if !self.invalidated
      && let Some(entry) = self.entry.as_ref().filter(|e| e.is_fresh(now))
    {
      tracing::debug!(fetched_at = %entry.fetched_at, "cache hit");
      return Ok(Arc::clone(&entry.value));
    }

    tracing::debug!(invalidated = self.invalidated, "cache miss, fetching");
    let records = self.source.fetch().await.map_err(Error::fetch)?;

    let value = Arc::new(records);
    self.entry = Some(CacheEntry {
      value:      Arc::clone(&value),
      fetched_at: self.clock.now(),
      ttl:        self.ttl,
    });
    self.invalidated = false;
    tracing::debug!(rows = value.len(), "cache filled");
    Ok(value)
  }

  /// Force the next [`get`](Self::get) to fetch regardless of TTL.
  pub fn invalidate(&mut self) { self.invalidated = true; }

  /// The last successful fetch, fresh or not.
  pub fn last_good(&self) -> Option<Arc<Vec<Record>>> {
    self.entry.as_ref().map(|e| Arc::clone(&e.value))
  }

  pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
    self.entry.as_ref().map(|e| e.fetched_at)
  }

  pub fn clock(&self) -> &C { &self.clock }

  pub fn source(&self) -> &S { &self.source }
}
