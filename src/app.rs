use crate::config::{Config, ContactConfig};
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{Notice, Shortcut, View, ViewAction};
use crate::ui::views::{CategoryListView, ContactView, SearchView};
use crate::ui::ViewContext;
use color_eyre::Result;
use crossterm::event::{DisableFocusChange, EnableFocusChange, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` command palette
  command: CommandInput,

  /// Services shared with every view
  ctx: ViewContext,

  api_url: String,
  contact: ContactConfig,

  /// Status line message, cleared on the next key press
  notice: Option<Notice>,

  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, ctx: ViewContext) -> Self {
    let root: Box<dyn View> = Box::new(CategoryListView::new(ctx.clone()));

    Self {
      view_stack: vec![root],
      command: CommandInput::new(),
      ctx,
      api_url: config.api.url.clone(),
      contact: config.contact.clone(),
      notice: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    // Focus reports stand in for the app coming back to the foreground
    stdout().execute(EnableFocusChange)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    stdout().execute(DisableFocusChange)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      // Views below the top keep polling so their results aren't left queued
      Event::Tick => self.view_stack.iter_mut().for_each(|view| view.tick()),
      Event::Resumed => {
        debug!("terminal regained focus, refreshing current view");
        if let Some(view) = self.view_stack.last_mut() {
          view.resume();
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    self.notice = None;

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let captured = self
      .view_stack
      .last()
      .is_some_and(|view| view.captures_input());

    if !captured || self.command.is_active() {
      match self.command.handle_key(key) {
        KeyResult::Handled | KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Replace(view) => {
        self.view_stack.pop();
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Notify(notice) => self.notice = Some(notice),
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    info!(command = cmd, "running command");
    match cmd {
      "categories" => {
        self.view_stack.truncate(1);
        self.view_stack[0] = Box::new(CategoryListView::new(self.ctx.clone()));
      }
      "search" => self.apply(ViewAction::Push(Box::new(SearchView::new(self.ctx.clone())))),
      "contact" => self.apply(ViewAction::Push(Box::new(ContactView::new(&self.contact)))),
      "language" => {
        let language = self.ctx.language().toggled();
        self.ctx.set_language(language);
        self.notice = Some(Notice::Info(format!("Language: {}", language.code())));
      }
      "quit" => self.should_quit = true,
      "" => {}
      other => self.notice = Some(Notice::Error(format!("Unknown command: {}", other))),
    }
  }

  // Accessors for UI rendering

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn current_shortcuts(&self) -> Vec<Shortcut> {
    self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default()
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  pub fn language(&self) -> crate::i18n::Language {
    self.ctx.language()
  }

  /// The explicit notice, or else the top view's last fetch error
  pub fn notice(&self) -> Option<Notice> {
    self.notice.clone().or_else(|| {
      self
        .view_stack
        .last()
        .and_then(|view| view.last_error())
        .map(|e| Notice::Error(format!("Offline: {}", e)))
    })
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::i18n::Language;
  use crate::ui::context::tests::offline_context;
  use std::cell::Cell;
  use std::rc::Rc;

  /// Counts lifecycle calls so stack routing can be checked
  struct Recorder {
    label: &'static str,
    ticks: Rc<Cell<u32>>,
    resumes: Rc<Cell<u32>>,
  }

  impl Recorder {
    fn boxed(label: &'static str) -> (Box<dyn View>, Rc<Cell<u32>>, Rc<Cell<u32>>) {
      let (ticks, resumes) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
      let view = Recorder {
        label,
        ticks: ticks.clone(),
        resumes: resumes.clone(),
      };
      (Box::new(view), ticks, resumes)
    }
  }

  impl View for Recorder {
    fn handle_key(&mut self, _key: KeyEvent) -> ViewAction {
      ViewAction::None
    }

    fn render(&mut self, _frame: &mut Frame, _area: Rect) {}

    fn breadcrumb_label(&self) -> String {
      self.label.to_string()
    }

    fn tick(&mut self) {
      self.ticks.set(self.ticks.get() + 1);
    }

    fn resume(&mut self) {
      self.resumes.set(self.resumes.get() + 1);
    }
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn app() -> App {
    let mut config = Config::default();
    config.api.url = "http://127.0.0.1:9".to_string();
    App::new(&config, offline_context())
  }

  fn run_command(app: &mut App, cmd: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in cmd.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  #[tokio::test]
  async fn test_starts_on_categories() {
    let app = app();
    assert_eq!(app.view_breadcrumb(), vec!["Categories"]);
  }

  #[tokio::test]
  async fn test_search_and_contact_commands_push() {
    let mut app = app();
    run_command(&mut app, "contact");
    assert_eq!(app.view_breadcrumb(), vec!["Categories", "Contact"]);

    run_command(&mut app, "categories");
    assert_eq!(app.view_breadcrumb(), vec!["Categories"]);

    run_command(&mut app, "s");
    assert_eq!(app.view_breadcrumb(), vec!["Categories", "Search"]);
  }

  #[tokio::test]
  async fn test_search_view_receives_colon() {
    let mut app = app();
    run_command(&mut app, "search");

    // The search box takes ':' as text instead of opening the palette
    app.handle_key(key(KeyCode::Char(':')));
    assert!(!app.command().is_active());
  }

  #[tokio::test]
  async fn test_language_toggle() {
    let mut app = app();
    run_command(&mut app, "language");
    assert_eq!(app.language(), Language::Ru);
    assert_eq!(app.notice(), Some(Notice::Info("Language: RU".to_string())));

    // Any key clears the notice
    app.handle_key(key(KeyCode::Char('j')));
    assert_ne!(app.notice(), Some(Notice::Info("Language: RU".to_string())));
  }

  #[tokio::test]
  async fn test_unknown_command_reports() {
    let mut app = app();
    run_command(&mut app, "zzz");
    assert_eq!(
      app.notice(),
      Some(Notice::Error("Unknown command: zzz".to_string()))
    );
  }

  #[tokio::test]
  async fn test_resume_refreshes_only_top_view() {
    let mut app = app();
    let (below, below_ticks, below_resumes) = Recorder::boxed("Below");
    let (top, top_ticks, top_resumes) = Recorder::boxed("Top");
    app.apply(ViewAction::Push(below));
    app.apply(ViewAction::Push(top));

    app.handle_event(Event::Resumed);
    assert_eq!(top_resumes.get(), 1);
    assert_eq!(below_resumes.get(), 0);

    // Ticks still reach the whole stack
    app.handle_event(Event::Tick);
    assert_eq!(top_ticks.get(), 1);
    assert_eq!(below_ticks.get(), 1);
  }

  #[tokio::test]
  async fn test_pop_at_root_quits() {
    let mut app = app();
    run_command(&mut app, "contact");
    app.handle_key(key(KeyCode::Char('q')));
    assert!(!app.should_quit);
    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }
}
