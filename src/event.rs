use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for query polling and timed UI (carousel)
  Tick,
  /// Terminal regained focus; views refresh as if the app was resumed
  Resumed,
}

/// Event handler that produces events from terminal input and a tick timer.
///
/// The reader stops on its next send after the handler is dropped.
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // crossterm's poll/read block, so they run on the blocking pool
    tokio::task::spawn_blocking(move || loop {
      let event = match event::poll(tick_rate) {
        Ok(true) => match event::read() {
          Ok(evt) => translate(evt),
          Err(_) => None,
        },
        Ok(false) => Some(Event::Tick),
        Err(_) => None,
      };

      if let Some(event) = event {
        if tx.send(event).is_err() {
          break;
        }
      } else if tx.is_closed() {
        break;
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

fn translate(evt: CrosstermEvent) -> Option<Event> {
  match evt {
    // Windows reports releases too; only presses drive the UI
    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
    CrosstermEvent::FocusGained => Some(Event::Resumed),
    _ => None,
  }
}
