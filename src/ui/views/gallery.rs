use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::api::{Item, ResourceKey};
use crate::query::{Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::freshness;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::ViewContext;

/// Every photo of one place, with a full view of the selected photo.
///
/// Caches the item document under its own `photos:` key.
pub struct PhotoGalleryView {
  ctx: ViewContext,
  name: String,
  query: Query<Item>,
  list_state: ListState,
  full_view: bool,
}

impl PhotoGalleryView {
  pub fn new(ctx: ViewContext, item_id: u64, name: String) -> Self {
    let key = ResourceKey::photos(item_id);
    ctx.api.sweep_on_mount(&key);

    let api = ctx.api.clone();
    let fetch_key = key.clone();
    let mut query = Query::new(move || {
      let api = api.clone();
      let key = fetch_key.clone();
      async move { api.refresh_item(&key).await.map_err(|e| e.to_string()) }
    })
    .seeded(ctx.api.cached_item(&key));

    query.mount();

    Self {
      ctx,
      name,
      query,
      list_state: ListState::default(),
      full_view: false,
    }
  }

  fn photos(&self) -> Vec<String> {
    self
      .query
      .data()
      .map(|item| item.photo_urls(self.ctx.api.base_url()))
      .unwrap_or_default()
  }

  fn title(&self, count: usize) -> String {
    let label = self.ctx.labels().photos;
    let status = freshness(&self.query, Utc::now());
    if status.is_empty() {
      format!(" {} ({}) ", label, count)
    } else {
      format!(" {} ({}) · {} ", label, count, status)
    }
  }

  fn render_grid(&mut self, frame: &mut Frame, area: Rect, photos: &[String], block: Block) {
    if photos.is_empty() {
      let content = match self.query.state() {
        QueryState::Loading | QueryState::Idle => "Loading photos...",
        QueryState::Empty => "Could not load photos. Press 'r' to retry.",
        _ => "No photos yet.",
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = photos
      .iter()
      .enumerate()
      .map(|(i, url)| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:>3}  ", i + 1), Style::default().fg(Color::DarkGray)),
          Span::styled(url.clone(), Style::default().fg(Color::Cyan)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_full(&self, frame: &mut Frame, area: Rect, photos: &[String], block: Block) {
    let index = self.list_state.selected().unwrap_or(0);
    let lines = match photos.get(index) {
      Some(url) => vec![
        Line::styled(
          format!("{} / {}", index + 1, photos.len()),
          Style::default().fg(Color::DarkGray),
        ),
        Line::raw(""),
        Line::styled(url.clone(), Style::default().fg(Color::Cyan).bold()),
      ],
      None => vec![Line::raw("")],
    };

    let paragraph = Paragraph::new(lines)
      .block(block)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down | KeyCode::Right => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up | KeyCode::Left => self.list_state.select_previous(),
      _ => return None,
    }
    let len = self.photos().len();
    ensure_valid_selection(&mut self.list_state, len);
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => {
        self.query.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Enter if !self.photos().is_empty() => {
        self.full_view = !self.full_view;
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc if self.full_view => {
        self.full_view = false;
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for PhotoGalleryView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_navigation(key)
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let photos = self.photos();
    ensure_valid_selection(&mut self.list_state, photos.len());

    let block = Block::default()
      .title(self.title(photos.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.full_view && !photos.is_empty() {
      self.render_full(frame, area, &photos, block);
    } else {
      self.render_grid(frame, area, &photos, block);
    }
  }

  fn breadcrumb_label(&self) -> String {
    let name = self
      .query
      .data()
      .map(|item| item.name.as_str())
      .unwrap_or(&self.name);
    format!("{} · {}", name, self.ctx.labels().photos)
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn resume(&mut self) {
    self.query.refetch();
  }

  fn last_error(&self) -> Option<&str> {
    self.query.last_error()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("enter", if self.full_view { "close" } else { "full view" })
        .with_priority(10),
      Shortcut::new("j/k", "photo").with_priority(20),
      Shortcut::new("r", "refresh").with_priority(30),
      Shortcut::new("q", "back").with_priority(40),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheKey;
  use crate::ui::context::tests::offline_context;
  use crate::ui::views::testing::{item_json, key, render_to_string, seed};

  fn warm_view() -> PhotoGalleryView {
    let ctx = offline_context();
    seed(
      &ctx,
      &ResourceKey::photos(7).cache_key(),
      item_json(7, 1, "Navat"),
      Utc::now(),
    );
    PhotoGalleryView::new(ctx, 7, "Navat".to_string())
  }

  #[tokio::test]
  async fn test_lists_media_urls() {
    let mut view = warm_view();
    let screen = render_to_string(&mut view, 80, 8);
    assert!(screen.contains("http://127.0.0.1:9/media/items/a.jpg"));
    assert!(screen.contains("http://127.0.0.1:9/media/items/c.jpg"));
    assert!(screen.contains("Photos (3)"));
  }

  #[tokio::test]
  async fn test_gallery_ignores_item_page_cache() {
    let ctx = offline_context();
    seed(
      &ctx,
      &ResourceKey::item(7).cache_key(),
      item_json(7, 1, "Navat"),
      Utc::now(),
    );
    let view = PhotoGalleryView::new(ctx, 7, "Navat".to_string());
    assert!(view.query.is_loading());
  }

  #[tokio::test]
  async fn test_enter_toggles_full_view() {
    let mut view = warm_view();
    render_to_string(&mut view, 80, 8);
    view.handle_key(key(KeyCode::Down));

    view.handle_key(key(KeyCode::Enter));
    assert!(view.full_view);
    let screen = render_to_string(&mut view, 80, 8);
    assert!(screen.contains("2 / 3"));
    assert!(screen.contains("items/b.jpg"));

    // Esc closes the full view before leaving the gallery
    assert!(matches!(view.handle_key(key(KeyCode::Esc)), ViewAction::None));
    assert!(!view.full_view);
    assert!(matches!(view.handle_key(key(KeyCode::Esc)), ViewAction::Pop));
  }
}
