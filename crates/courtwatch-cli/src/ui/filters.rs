//! The four filter panes, one per funnel level.

use courtwatch_core::record::Dimension;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState},
};

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage(20),
      Constraint::Percentage(40),
      Constraint::Percentage(22),
      Constraint::Percentage(18),
    ])
    .split(area);

  for dimension in Dimension::ALL {
    draw_level(f, cols[dimension.index()], app, dimension);
  }
}

fn draw_level(f: &mut Frame, area: Rect, app: &App, dimension: Dimension) {
  let options = app.options(dimension);
  let requested = app.selection.get(dimension);
  let shown = options.iter().filter(|v| requested.contains(*v)).count();
  let gone = requested.len() - shown;
  let focused = app.focus == dimension;

  let mut title = if requested.is_empty() {
    format!(" {} (all {}) ", dimension.label(), options.len())
  } else {
    format!(" {} ({shown}/{}) ", dimension.label(), options.len())
  };
  // Chosen values with no slots right now are still watched.
  if gone > 0 {
    title.push_str(&format!("+{gone} booked out "));
  }

  let border = if focused {
    Style::default().fg(Color::Cyan)
  } else {
    Style::default().fg(Color::DarkGray)
  };
  let block = Block::default().title(title).borders(Borders::ALL).border_style(border);

  let items: Vec<ListItem> = options
    .iter()
    .map(|value| {
      let on = app.selection.is_selected(dimension, value);
      let mark = if on { "[x] " } else { "[ ] " };
      let style = if on {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(Color::Gray)
      };
      ListItem::new(Line::from(vec![
        Span::styled(mark, style),
        Span::styled(value.clone(), style),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select((focused && !options.is_empty()).then_some(app.cursors[dimension.index()]));

  f.render_stateful_widget(
    List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
      .highlight_symbol(""),
    area,
    &mut state,
  );
}
