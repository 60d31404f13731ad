//! Full page for one place: description, working hours, location, photo
//! carousel and contact actions.

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::time::{Duration, Instant};

use crate::actions::{self, maps_url, ActionError, ActionOutcome};
use crate::api::{Item, ResourceKey};
use crate::query::{Query, QueryState};
use crate::ui::renderfns::freshness;
use crate::ui::view::{Notice, Shortcut, View, ViewAction};
use crate::ui::views::PhotoGalleryView;
use crate::ui::ViewContext;

/// How long each photo stays up in the carousel
pub const CAROUSEL_INTERVAL: Duration = Duration::from_secs(5);

pub struct ItemDetailView {
  ctx: ViewContext,
  item_id: u64,
  name: String,
  query: Query<Item>,
  carousel: Carousel,
  scroll: u16,
}

/// Index into the photo list that advances on a timer
#[derive(Debug)]
struct Carousel {
  index: usize,
  last_advance: Instant,
}

impl Carousel {
  fn new(now: Instant) -> Self {
    Self {
      index: 0,
      last_advance: now,
    }
  }

  /// Advance if the interval has passed. Returns true when the index moved.
  fn tick(&mut self, len: usize, now: Instant) -> bool {
    if len < 2 || now.duration_since(self.last_advance) < CAROUSEL_INTERVAL {
      return false;
    }
    self.index = (self.index + 1) % len;
    self.last_advance = now;
    true
  }

  fn step(&mut self, len: usize, forward: bool, now: Instant) {
    if len == 0 {
      return;
    }
    self.index = if forward {
      (self.index + 1) % len
    } else {
      self.index.checked_sub(1).unwrap_or(len - 1)
    };
    self.last_advance = now;
  }

  /// Keep the index valid after the photo list changed
  fn clamp(&mut self, len: usize) {
    if self.index >= len {
      self.index = 0;
    }
  }
}

impl ItemDetailView {
  pub fn new(ctx: ViewContext, item_id: u64, name: String) -> Self {
    let key = ResourceKey::item(item_id);
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
      item_id,
      name,
      query,
      carousel: Carousel::new(Instant::now()),
      scroll: 0,
    }
  }

  fn item(&self) -> Option<&Item> {
    self.query.data()
  }

  fn photos(&self) -> Vec<String> {
    self
      .item()
      .map(|item| item.photo_urls(self.ctx.api.base_url()))
      .unwrap_or_default()
  }

  fn run_action(
    &self,
    action: fn(&Item) -> Result<ActionOutcome, ActionError>,
  ) -> ViewAction {
    let notice = match self.item().map(action) {
      Some(Ok(outcome)) => Notice::Info(outcome.to_string()),
      Some(Err(e)) => Notice::Error(e.to_string()),
      None => Notice::Error("Still loading this place".to_string()),
    };
    ViewAction::Notify(notice)
  }

  fn lines(&self, item: &Item) -> Vec<Line<'static>> {
    let labels = self.ctx.labels();
    let heading = Style::default().fg(Color::Yellow).bold();
    let dim = Style::default().fg(Color::DarkGray);

    let mut lines = vec![Line::styled(labels.overview, heading)];
    if item.description.trim().is_empty() {
      lines.push(Line::styled(labels.no_description, dim));
    } else {
      lines.extend(item.description.lines().map(|l| Line::raw(l.to_string())));
    }
    if !item.address.is_empty() {
      lines.push(Line::raw(""));
      lines.push(Line::raw(item.address.clone()));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(labels.working_hours, heading));
    for (day, hours) in item.weekly_hours() {
      let (text, style) = match hours {
        Some(hours) => (hours, Style::default()),
        None => (labels.closed.to_string(), dim),
      };
      lines.push(Line::from(vec![
        Span::raw(format!("  {:<14}", labels.weekday(day))),
        Span::styled(text, style),
      ]));
    }

    // Map center follows the latest data
    lines.push(Line::raw(""));
    lines.push(Line::styled(labels.location, heading));
    lines.push(Line::raw(format!(
      "  {:.5}, {:.5}",
      item.latitude, item.longitude
    )));
    lines.push(Line::styled(
      format!("  {}", maps_url(item.latitude, item.longitude)),
      Style::default().fg(Color::Cyan),
    ));

    lines.push(Line::raw(""));
    lines.push(Line::styled(labels.photos, heading));
    let photos = self.photos();
    match photos.get(self.carousel.index) {
      Some(url) => {
        lines.push(Line::from(vec![
          Span::styled(
            format!("  [{}/{}] ", self.carousel.index + 1, photos.len()),
            dim,
          ),
          Span::styled(url.clone(), Style::default().fg(Color::Cyan)),
        ]));
        lines.push(Line::styled(format!("  <g> {}", labels.view_all), dim));
      }
      None => lines.push(Line::styled("  -", dim)),
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
      Span::styled("<c>", Style::default().fg(Color::Cyan)),
      Span::raw(format!(" {}   ", labels.call_now)),
      Span::styled("<y>", Style::default().fg(Color::Cyan)),
      Span::raw(format!(" {}   ", labels.copy_number)),
      Span::styled("<w>", Style::default().fg(Color::Cyan)),
      Span::raw(format!(" {}   ", labels.open_whatsapp)),
      Span::styled("<m>", Style::default().fg(Color::Cyan)),
      Span::raw(format!(" {}", labels.open_in_maps)),
    ]));

    lines
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Right | KeyCode::Char('l') => {
        let len = self.photos().len();
        self.carousel.step(len, true, Instant::now());
      }
      KeyCode::Left | KeyCode::Char('h') => {
        let len = self.photos().len();
        self.carousel.step(len, false, Instant::now());
      }
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
      KeyCode::Char('c') => Some(self.run_action(actions::call)),
      KeyCode::Char('y') => Some(self.run_action(actions::copy_number)),
      KeyCode::Char('w') => Some(self.run_action(actions::whatsapp)),
      KeyCode::Char('m') => Some(self.run_action(|item| Ok(actions::open_in_maps(item)))),
      KeyCode::Char('g') => Some(ViewAction::Push(Box::new(PhotoGalleryView::new(
        self.ctx.clone(),
        self.item_id,
        self.breadcrumb_label(),
      )))),
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for ItemDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_navigation(key)
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let status = freshness(&self.query, Utc::now());
    let title = if status.is_empty() {
      format!(" {} ", self.breadcrumb_label())
    } else {
      format!(" {} · {} ", self.breadcrumb_label(), status)
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = match (self.item(), self.query.state()) {
      (Some(item), _) => Paragraph::new(self.lines(item)).scroll((self.scroll, 0)),
      (None, QueryState::Empty) => Paragraph::new("Could not load this place. Press 'r' to retry.")
        .style(Style::default().fg(Color::DarkGray)),
      (None, _) => Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray)),
    };

    frame.render_widget(
      paragraph.block(block).wrap(Wrap { trim: false }),
      area,
    );
  }

  fn breadcrumb_label(&self) -> String {
    self
      .item()
      .map(|item| item.name.clone())
      .unwrap_or_else(|| self.name.clone())
  }

  fn tick(&mut self) {
    if self.query.poll() {
      // New data may carry a different photo list
      let len = self.photos().len();
      self.carousel.clamp(len);
    }
    let len = self.photos().len();
    self.carousel.tick(len, Instant::now());
  }

  fn resume(&mut self) {
    self.query.refetch();
  }

  fn last_error(&self) -> Option<&str> {
    self.query.last_error()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("c", "call").with_priority(10),
      Shortcut::new("y", "copy").with_priority(11),
      Shortcut::new("w", "whatsapp").with_priority(12),
      Shortcut::new("m", "maps").with_priority(13),
      Shortcut::new("g", "gallery").with_priority(14),
      Shortcut::new("←/→", "photo").with_priority(20),
      Shortcut::new("r", "refresh").with_priority(30),
      Shortcut::new("q", "back").with_priority(40),
    ]
  }
}
