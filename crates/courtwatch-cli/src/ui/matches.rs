//! Match table: the filtered, available records.

use courtwatch_core::monitor::DataState;
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Row, Table},
};

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(view) = &app.view else {
    draw_message(f, area, " Matches ", "Loading availability…");
    return;
  };

  let filtered = &view.funnel.filtered;
  let mut title = format!(" Matches ({}) ", filtered.len());
  if view.is_stale() {
    title.push_str("[stale] ");
  }

  if filtered.is_empty() {
    let message = match view.data {
      Some(DataState::Empty) => "The source returned no rows.",
      Some(DataState::NoAvailability) => "Nothing has courts left right now.",
      _ => "No slots match the current filters.",
    };
    draw_message(f, area, &title, message);
    return;
  }

  let header = Row::new(["District", "Venue", "Date", "Time", "Courts"])
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

  let rows = filtered.iter().map(|record| {
    Row::new([
      record.district.clone().unwrap_or_default(),
      record.venue.clone().unwrap_or_default(),
      record.date.clone().unwrap_or_default(),
      record.start_time.clone().unwrap_or_default(),
      record.available_count.to_string(),
    ])
  });

  let border = if app.monitoring { Color::Green } else { Color::DarkGray };
  let widths = [
    Constraint::Percentage(18),
    Constraint::Percentage(42),
    Constraint::Length(12),
    Constraint::Length(7),
    Constraint::Length(7),
  ];
  let table = Table::new(rows, widths).header(header).block(
    Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border)),
  );

  f.render_widget(table, area);
}

fn draw_message(f: &mut Frame, area: Rect, title: &str, message: &str) {
  let block = Block::default()
    .title(title.to_string())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new(Line::from(vec![Span::styled(
      message.to_string(),
      Style::default().fg(Color::DarkGray),
    )])),
    inner,
  );
}
