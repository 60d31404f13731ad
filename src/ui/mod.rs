pub mod components;
pub mod context;
pub mod renderfns;
pub mod view;
pub mod views;

pub use context::ViewContext;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::vertical([
    Constraint::Length(1), // Header
    Constraint::Min(1),    // Main content
    Constraint::Length(1), // Footer
  ])
  .split(frame.area());

  let shortcuts = app.current_shortcuts();
  renderfns::draw_header(
    frame,
    chunks[0],
    app.api_url(),
    app.language().code(),
    &shortcuts,
  );

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }
  app.command().render_overlay(frame, chunks[1]);

  renderfns::draw_footer(
    frame,
    chunks[2],
    &app.view_breadcrumb(),
    app.notice().as_ref(),
  );
}

/// Keep a list selection inside `0..len`, selecting the first row when
/// rows appear and clearing it when the list empties.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(7));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
