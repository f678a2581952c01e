//! The boundary to the notification delivery subsystem.

use crate::gate::Fingerprint;

/// Whether the user allowed alerts to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
  /// Never asked.
  #[default]
  Default,
  Granted,
  Denied,
}

impl Permission {
  pub fn is_granted(self) -> bool { matches!(self, Self::Granted) }
}

/// A user-facing alert for a newly appeared match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
  pub title:       String,
  pub body:        String,
  /// Venue of the first matched record, `Court` when unknown.
  pub venue:       String,
  pub matches:     usize,
  pub fingerprint: Fingerprint,
}

/// What the delivery subsystem did with an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  Shown,
  /// Silently dropped (e.g. the platform refused). Not an error.
  Dropped,
}

/// Shows alerts to the user.
pub trait Notifier: Send + Sync {
  fn notify(&self, alert: &Alert) -> Delivery;
}

/// Discards every alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
  fn notify(&self, _alert: &Alert) -> Delivery { Delivery::Dropped }
}
