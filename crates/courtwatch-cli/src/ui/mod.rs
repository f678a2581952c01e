//! TUI rendering: header, filter panes, match table, status bar.

pub mod filters;
pub mod matches;

use chrono::{DateTime, Local, Utc};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::App;

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1),      // header
      Constraint::Percentage(45), // filters
      Constraint::Min(0),         // matches
      Constraint::Length(1),      // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  filters::draw(f, rows[1], app);
  matches::draw(f, rows[2], app);
  draw_status(f, rows[3], app);
}

fn local_time(at: DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let left = Span::styled(
    " courtwatch  tennis court availability",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  );

  let checked = app
    .view
    .as_ref()
    .and_then(|v| v.checked_at)
    .map(|at| format!("checked {}", local_time(at)))
    .unwrap_or_else(|| "not checked yet".into());
  let right = match &app.last_alert {
    Some((at, alert)) => Span::styled(
      format!("alert {} {}  {checked} ", local_time(*at), alert.venue),
      Style::default().fg(Color::LightGreen),
    ),
    None => Span::styled(format!("{checked} "), Style::default().fg(Color::Gray)),
  };

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (label, colour) = if app.monitoring {
    (" LIVE ", Color::Green)
  } else {
    (" IDLE ", Color::Cyan)
  };

  let mode_span = Span::styled(
    label,
    Style::default().fg(Color::Black).bg(colour).add_modifier(Modifier::BOLD),
  );

  let bell = if app.permission.is_granted() { "🔔" } else { "🔕" };

  let (text, style) = if let Some(warning) = &app.warning {
    let stale = if app.view.as_ref().is_some_and(|v| v.is_stale()) {
      " (showing last good data)"
    } else {
      ""
    };
    (format!("  ⚠ {warning}{stale}"), Style::default().fg(Color::Yellow))
  } else if !app.status_msg.is_empty() {
    (format!("  {}", app.status_msg), Style::default().fg(Color::Gray))
  } else {
    (
      "  Tab level  jk move  Space toggle  a all/none  m monitor  r refresh  n alerts  q quit"
        .to_string(),
      Style::default().fg(Color::DarkGray),
    )
  };

  let line = Line::from(vec![
    mode_span,
    Span::raw(format!(" {bell}")),
    Span::styled(text, style),
  ]);
  f.render_widget(Paragraph::new(line).style(Style::default().bg(Color::Black)), area);
}
