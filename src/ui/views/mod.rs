mod categories;
mod category;
mod contact;
mod gallery;
mod item_detail;
mod search;

pub use categories::CategoryListView;
pub use category::CategoryView;
pub use contact::ContactView;
pub use gallery::PhotoGalleryView;
pub use item_detail::ItemDetailView;
pub use search::SearchView;

#[cfg(test)]
pub(crate) mod testing {
  use crate::cache::CacheRecord;
  use crate::ui::view::View;
  use crate::ui::ViewContext;
  use chrono::{DateTime, Utc};
  use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;
  use std::time::Duration;

  pub(crate) fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  /// Put a raw document into the cache under `key`
  pub(crate) fn seed(ctx: &ViewContext, key: &str, payload: serde_json::Value, at: DateTime<Utc>) {
    ctx.api.store().set(key, CacheRecord::new(key, payload, at));
  }

  pub(crate) fn item_json(id: u64, category: u64, name: &str) -> serde_json::Value {
    serde_json::json!({
      "id": id,
      "category": category,
      "name": name,
      "description": "Plov and shashlik",
      "address": "Chui Ave 12",
      "latitude": 42.87,
      "longitude": 74.59,
      "working_hours": {"monday": "10:00 - 22:00", "sunday": ""},
      "whatsapp_number": "",
      "phone_numbers": "+996 555 111 222, +996 312 000 000",
      "photos": ["items/a.jpg", "items/b.jpg", "items/c.jpg"]
    })
  }

  /// Render a view into an off-screen buffer and return its text
  pub(crate) fn render_to_string<V: View>(view: &mut V, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| view.render(frame, frame.area())).unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect()
  }

  /// Tick a view until `done` holds, giving background fetches time to land
  pub(crate) async fn tick_until<V: View>(view: &mut V, done: impl Fn(&V) -> bool) -> bool {
    for _ in 0..500 {
      view.tick();
      if done(view) {
        return true;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
  }
}
