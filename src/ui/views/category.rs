use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::actions::phone_numbers;
use crate::api::{Category, Item};
use crate::query::{Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{freshness, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::{ItemDetailView, PhotoGalleryView};
use crate::ui::ViewContext;

/// The places listed in one category
pub struct CategoryView {
  ctx: ViewContext,
  name: String,
  category: Query<Category>,
  items: Query<Vec<Item>>,
  list_state: ListState,
}

impl CategoryView {
  pub fn new(ctx: ViewContext, category_id: u64, name: String) -> Self {
    let api = ctx.api.clone();
    let mut category = Query::new(move || {
      let api = api.clone();
      async move {
        api
          .refresh_category(category_id)
          .await
          .map_err(|e| e.to_string())
      }
    })
    .seeded(ctx.api.cached_category(category_id));

    let api = ctx.api.clone();
    let mut items = Query::new(move || {
      let api = api.clone();
      async move {
        api
          .refresh_items_in_category(category_id)
          .await
          .map_err(|e| e.to_string())
      }
    })
    .seeded(ctx.api.cached_items_in_category(category_id));

    category.mount();
    items.mount();

    Self {
      ctx,
      name,
      category,
      items,
      list_state: ListState::default(),
    }
  }

  fn items(&self) -> &[Item] {
    self.items.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected(&self) -> Option<&Item> {
    self.list_state.selected().and_then(|i| self.items().get(i))
  }

  fn title(&self) -> &str {
    self
      .category
      .data()
      .map(|c| c.name.as_str())
      .unwrap_or(&self.name)
  }

  fn refetch(&mut self) {
    self.category.refetch();
    self.items.refetch();
  }

  fn render_header(&self, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
      self.title().to_string(),
      Style::default().fg(Color::Yellow).bold(),
    )];
    if let Some(icon) = self.category.data().and_then(|c| c.icon.as_deref()) {
      spans.push(Span::styled(
        format!("  {}", icon),
        Style::default().fg(Color::DarkGray),
      ));
    }

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.items().len();
    ensure_valid_selection(&mut self.list_state, len);

    let status = freshness(&self.items, Utc::now());
    let title = if status.is_empty() {
      format!(" Places ({}) ", len)
    } else {
      format!(" Places ({}) · {} ", len, status)
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = match self.items.state() {
        QueryState::Loading | QueryState::Idle => "Loading places...",
        QueryState::Empty => "Could not load places. Press 'r' to retry.",
        _ => "No places in this category yet.",
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let name_width = (area.width as usize / 3).max(12);
    let items: Vec<ListItem> = self
      .items()
      .iter()
      .map(|item| {
        let phone = phone_numbers(&item.phone_numbers)
          .into_iter()
          .next()
          .unwrap_or_default();
        ListItem::new(Line::from(vec![
          Span::raw(format!(
            "{:<width$}",
            truncate(&item.name, name_width),
            width = name_width
          )),
          Span::raw(" "),
          Span::styled(
            format!("{:<18}", phone),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            truncate(&item.address, name_width),
            Style::default().fg(Color::DarkGray),
          ),
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

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.list_state.select_last(),
      _ => return None,
    }
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => {
        self.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        let item = self.selected()?;
        Some(ViewAction::Push(Box::new(ItemDetailView::new(
          self.ctx.clone(),
          item.id,
          item.name.clone(),
        ))))
      }
      KeyCode::Char('p') => {
        let item = self.selected()?;
        Some(ViewAction::Push(Box::new(PhotoGalleryView::new(
          self.ctx.clone(),
          item.id,
          item.name.clone(),
        ))))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for CategoryView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_navigation(key)
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(area);
    self.render_header(frame, chunks[0]);
    self.render_list(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    self.title().to_string()
  }

  fn tick(&mut self) {
    self.category.poll();
    self.items.poll();
  }

  fn resume(&mut self) {
    self.refetch();
  }

  fn last_error(&self) -> Option<&str> {
    self.items.last_error().or(self.category.last_error())
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("enter", "details").with_priority(20),
      Shortcut::new("p", "photos").with_priority(25),
      Shortcut::new("r", "refresh").with_priority(30),
      Shortcut::new("q", "back").with_priority(40),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::context::tests::offline_context;
  use crate::ui::views::testing::{item_json, key, render_to_string, seed, tick_until};
  use serde_json::json;

  #[tokio::test]
  async fn test_lists_only_places_in_category() {
    let ctx = offline_context();
    seed(
      &ctx,
      "items",
      json!([
        item_json(1, 4, "Navat"),
        item_json(2, 5, "Hyatt"),
        item_json(3, 4, "Faiza")
      ]),
      Utc::now(),
    );

    let mut view = CategoryView::new(ctx, 4, "Restaurants".to_string());
    let names: Vec<&str> = view.items().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Navat", "Faiza"]);

    let screen = render_to_string(&mut view, 100, 10);
    assert!(screen.contains("Restaurants"));
    assert!(screen.contains("+996 555 111 222"));
    assert!(!screen.contains("Hyatt"));
  }

  #[tokio::test]
  async fn test_cached_category_name_wins_over_link_text() {
    let ctx = offline_context();
    seed(&ctx, "category:4", json!({"id": 4, "name": "Food & Drink"}), Utc::now());

    let view = CategoryView::new(ctx, 4, "Restaurants".to_string());
    assert_eq!(view.breadcrumb_label(), "Food & Drink");
  }

  #[tokio::test]
  async fn test_enter_and_p_open_place_screens() {
    let ctx = offline_context();
    seed(&ctx, "items", json!([item_json(1, 4, "Navat")]), Utc::now());

    let mut view = CategoryView::new(ctx, 4, "Restaurants".to_string());
    render_to_string(&mut view, 80, 10);

    match view.handle_key(key(KeyCode::Enter)) {
      ViewAction::Push(next) => assert_eq!(next.breadcrumb_label(), "Navat"),
      _ => panic!("expected item detail"),
    }
    match view.handle_key(key(KeyCode::Char('p'))) {
      ViewAction::Push(next) => assert!(next.breadcrumb_label().contains("Navat")),
      _ => panic!("expected gallery"),
    }
  }

  #[tokio::test]
  async fn test_offline_cold_start_ends_in_placeholder() {
    let mut view = CategoryView::new(offline_context(), 4, "Restaurants".to_string());
    assert!(
      tick_until(&mut view, |v| !v.items.is_refreshing() && !v.category.is_refreshing()).await
    );

    let screen = render_to_string(&mut view, 80, 10);
    assert!(screen.contains("Could not load places"));
    // The link text still titles the screen
    assert!(screen.contains("Restaurants"));
  }
}
