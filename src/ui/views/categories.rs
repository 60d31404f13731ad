use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::api::Category;
use crate::query::{Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::freshness;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::{CategoryView, SearchView};
use crate::ui::ViewContext;

/// Root view: every business category
pub struct CategoryListView {
  ctx: ViewContext,
  query: Query<Vec<Category>>,
  list_state: ListState,
}

impl CategoryListView {
  pub fn new(ctx: ViewContext) -> Self {
    let api = ctx.api.clone();
    let mut query = Query::new(move || {
      let api = api.clone();
      async move { api.refresh_categories().await.map_err(|e| e.to_string()) }
    })
    .seeded(ctx.api.cached_categories());

    query.mount();

    Self {
      ctx,
      query,
      list_state: ListState::default(),
    }
  }

  fn categories(&self) -> &[Category] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected(&self) -> Option<&Category> {
    self.list_state.selected().and_then(|i| self.categories().get(i))
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.categories().len();
    ensure_valid_selection(&mut self.list_state, len);

    let status = freshness(&self.query, Utc::now());
    let title = if status.is_empty() {
      format!(" Categories ({}) ", len)
    } else {
      format!(" Categories ({}) · {} ", len, status)
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = match self.query.state() {
        QueryState::Loading | QueryState::Idle => "Loading categories...",
        QueryState::Empty => "Could not load categories. Press 'r' to retry.",
        _ => "No categories yet.",
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .categories()
      .iter()
      .map(|category| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<6}", category.id),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(category.name.clone()),
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
        self.query.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Char('/') => Some(ViewAction::Push(Box::new(SearchView::new(self.ctx.clone())))),
      KeyCode::Enter => {
        let category = self.selected()?;
        Some(ViewAction::Push(Box::new(CategoryView::new(
          self.ctx.clone(),
          category.id,
          category.name.clone(),
        ))))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for CategoryListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_navigation(key)
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Categories".to_string()
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
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("/", "search").with_priority(15),
      Shortcut::new("enter", "open").with_priority(20),
      Shortcut::new("r", "refresh").with_priority(30),
      Shortcut::new("q", "quit").with_priority(40),
    ]
  }
}
