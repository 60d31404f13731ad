use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Replace the current view (search results navigate this way)
  Replace(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Show a message on the status line
  Notify(Notice),
}

/// A one-line message for the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  Info(String),
  Error(String),
}

impl Notice {
  pub fn text(&self) -> &str {
    match self {
      Notice::Info(s) | Notice::Error(s) => s,
    }
  }
}

/// Trait for view behavior
///
/// Views handle their own input and return actions for the App to execute.
/// Views that load data own a Query<T> seeded from the cache and poll it
/// in tick().
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to allow views to poll async queries
  fn tick(&mut self) {}

  /// Called when the app comes back to the foreground
  fn resume(&mut self) {}

  /// The most recent background fetch error, shown on the status line
  fn last_error(&self) -> Option<&str> {
    None
  }

  /// True while the view is showing a text input that should receive
  /// every key (global shortcuts are suspended)
  fn captures_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("r", "refresh").with_priority(20),
      Shortcut::new("q", "back").with_priority(30),
    ]
  }
}
