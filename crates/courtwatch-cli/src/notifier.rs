//! Terminal alert delivery: a bell, optionally with a one-line banner.

use std::{
  io::{self, Write},
  sync::Mutex,
};

use courtwatch_core::notify::{Alert, Delivery, Notifier};

pub struct TerminalNotifier<W = io::Stderr> {
  out:    Mutex<W>,
  /// Print the alert text as well as ringing the bell. Off in TUI mode,
  /// where the status bar shows the alert instead.
  banner: bool,
}

impl TerminalNotifier {
  pub fn stderr(banner: bool) -> Self { Self::new(io::stderr(), banner) }
}

impl<W: Write + Send> TerminalNotifier<W> {
  pub fn new(out: W, banner: bool) -> Self { Self { out: Mutex::new(out), banner } }

  fn write(&self, alert: &Alert) -> io::Result<()> {
    let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
    if self.banner {
      writeln!(out, "\x07{}: {} ({} slots)", alert.title, alert.body, alert.matches)?;
    } else {
      write!(out, "\x07")?;
    }
    out.flush()
  }
}

impl<W: Write + Send> Notifier for TerminalNotifier<W> {
  fn notify(&self, alert: &Alert) -> Delivery {
    match self.write(alert) {
      Ok(()) => Delivery::Shown,
      Err(e) => {
        tracing::warn!(error = %e, "could not write alert to terminal");
        Delivery::Dropped
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use courtwatch_core::{gate::Fingerprint, record::Record};

  use super::*;

  fn alert() -> Alert {
    Alert {
      title:       "Court Found!".into(),
      body:        "Go book at Victoria Park now!".into(),
      venue:       "Victoria Park".into(),
      matches:     3,
      fingerprint: Fingerprint::of(&[Record::new("A", "Victoria Park", "2024-01-01", "19:00", 1)]),
    }
  }

  #[test]
  fn banner_mode_writes_the_message() {
    let notifier = TerminalNotifier::new(Vec::new(), true);
    assert_eq!(notifier.notify(&alert()), Delivery::Shown);

    let written = String::from_utf8(notifier.out.into_inner().unwrap()).unwrap();
    assert_eq!(written, "\x07Court Found!: Go book at Victoria Park now! (3 slots)\n");
  }

  #[test]
  fn quiet_mode_only_rings() {
    let notifier = TerminalNotifier::new(Vec::new(), false);
    notifier.notify(&alert());
    assert_eq!(notifier.out.into_inner().unwrap(), b"\x07");
  }
}
