//! Filter-as-you-type search over every place and category.

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::api::{Category, Item};
use crate::cache::CacheRecord;
use crate::query::Query;
use crate::search::{self, EntryKind, SearchEntry};
use crate::ui::components::{InputResult, TextInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::freshness;
use crate::ui::view::{Notice, Shortcut, View, ViewAction};
use crate::ui::views::{CategoryView, ItemDetailView};
use crate::ui::ViewContext;

type Catalog = (Vec<Item>, Vec<Category>);

/// Why a row is in the list
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowTag {
  Match,
  Recent,
  Popular(u32),
}

#[derive(Debug, Clone)]
struct Row {
  entry: SearchEntry,
  tag: RowTag,
}

pub struct SearchView {
  ctx: ViewContext,
  input: TextInput,
  catalog: Query<Catalog>,
  rows: Vec<Row>,
  list_state: ListState,
}

impl SearchView {
  pub fn new(ctx: ViewContext) -> Self {
    let api = ctx.api.clone();
    let mut catalog = Query::new(move || {
      let api = api.clone();
      async move {
        futures::try_join!(api.refresh_items(), api.refresh_categories())
          .map_err(|e| e.to_string())
      }
    })
    .seeded(cached_catalog(&ctx));

    catalog.mount();

    let mut view = Self {
      ctx,
      input: TextInput::new(),
      catalog,
      rows: Vec::new(),
      list_state: ListState::default(),
    };
    view.rebuild_rows();
    view
  }

  /// Recompute the list from the query text, the catalog and the history
  fn rebuild_rows(&mut self) {
    let query = self.input.value();

    self.rows = if query.trim().is_empty() {
      let history = self.ctx.history.borrow();
      let recent = history.recent().iter().map(|entry| Row {
        entry: entry.clone(),
        tag: RowTag::Recent,
      });
      let popular = history.popular().into_iter().map(|click| Row {
        entry: click.entry,
        tag: RowTag::Popular(click.count),
      });
      let rows: Vec<Row> = recent.chain(popular).collect();
      rows
    } else {
      let (items, categories) = match self.catalog.data() {
        Some((items, categories)) => (items.as_slice(), categories.as_slice()),
        None => (&[][..], &[][..]),
      };
      search::filter(query, items, categories)
        .into_iter()
        .map(|entry| Row {
          entry,
          tag: RowTag::Match,
        })
        .collect()
    };

    ensure_valid_selection(&mut self.list_state, self.rows.len());
  }

  fn open_selected(&mut self) -> ViewAction {
    let Some(row) = self.list_state.selected().and_then(|i| self.rows.get(i)) else {
      return ViewAction::None;
    };
    let entry = row.entry.clone();

    self.ctx.history.borrow_mut().record_click(&entry);

    let next: Box<dyn View> = match entry.kind {
      EntryKind::Item => Box::new(ItemDetailView::new(self.ctx.clone(), entry.id, entry.name)),
      EntryKind::Category => Box::new(CategoryView::new(self.ctx.clone(), entry.id, entry.name)),
    };
    ViewAction::Replace(next)
  }

  fn render_input(&self, frame: &mut Frame, area: Rect) {
    let value = self.input.value();
    let cursor = self.input.cursor_position();
    let before: String = value.chars().take(cursor).collect();
    let after: String = value.chars().skip(cursor).collect();

    let line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(Color::Yellow)),
      Span::raw(after),
    ]);

    let block = Block::default()
      .title(" Search ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(Paragraph::new(line).block(block), area);
  }

  fn render_results(&mut self, frame: &mut Frame, area: Rect) {
    let status = freshness(&self.catalog, Utc::now());
    let heading = if self.input.value().trim().is_empty() {
      "Recent & popular".to_string()
    } else {
      format!("Results ({})", self.rows.len())
    };
    let title = if status.is_empty() {
      format!(" {} ", heading)
    } else {
      format!(" {} · {} ", heading, status)
    };

    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.rows.is_empty() {
      let content = if self.input.value().trim().is_empty() {
        "Start typing to search places and categories."
      } else if self.catalog.data().is_none() && self.catalog.is_refreshing() {
        "Loading places..."
      } else {
        "Nothing found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .rows
      .iter()
      .map(|row| {
        let kind = match row.entry.kind {
          EntryKind::Item => "place   ",
          EntryKind::Category => "category",
        };
        let tag = match row.tag {
          RowTag::Match => String::new(),
          RowTag::Recent => "  recent".to_string(),
          RowTag::Popular(count) => format!("  popular ×{}", count),
        };
        ListItem::new(Line::from(vec![
          Span::styled(format!("{} ", kind), Style::default().fg(Color::Cyan)),
          Span::raw(row.entry.name.clone()),
          Span::styled(tag, Style::default().fg(Color::DarkGray)),
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
}

/// Seed only when both halves are cached, stamped with the older fetch
fn cached_catalog(ctx: &ViewContext) -> Option<CacheRecord<Catalog>> {
  let items = ctx.api.cached_items()?;
  let categories = ctx.api.cached_categories()?;
  let fetched_at = items.fetched_at.min(categories.fetched_at);
  Some(CacheRecord::new(
    "search",
    (items.payload, categories.payload),
    fetched_at,
  ))
}

impl View for SearchView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Down | KeyCode::Tab => {
        self.list_state.select_next();
        ensure_valid_selection(&mut self.list_state, self.rows.len());
        return ViewAction::None;
      }
      KeyCode::Up | KeyCode::BackTab => {
        self.list_state.select_previous();
        return ViewAction::None;
      }
      KeyCode::Char('k') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.ctx.history.borrow_mut().clear_click_counts();
        self.rebuild_rows();
        return ViewAction::Notify(Notice::Info("Popular searches cleared".to_string()));
      }
      KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.catalog.refetch();
        return ViewAction::None;
      }
      _ => {}
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => self.open_selected(),
      InputResult::Cancelled => ViewAction::Pop,
      InputResult::Consumed => {
        self.list_state.select(None);
        self.rebuild_rows();
        ViewAction::None
      }
      InputResult::NotHandled => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(area);
    self.render_input(frame, chunks[0]);
    self.render_results(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Search".to_string()
  }

  fn tick(&mut self) {
    if self.catalog.poll() {
      self.rebuild_rows();
    }
  }

  fn resume(&mut self) {
    self.catalog.refetch();
  }

  fn last_error(&self) -> Option<&str> {
    self.catalog.last_error()
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("enter", "open").with_priority(10),
      Shortcut::new("↑/↓", "select").with_priority(20),
      Shortcut::new("ctrl-r", "refresh").with_priority(30),
      Shortcut::new("ctrl-k", "clear popular").with_priority(35),
      Shortcut::new("esc", "back").with_priority(40),
    ]
  }
}
