use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::actions::phone_numbers;
use crate::config::ContactConfig;
use crate::ui::ensure_valid_selection;
use crate::ui::view::{Notice, Shortcut, View, ViewAction};

/// One way of reaching the directory operators
#[derive(Debug, Clone, PartialEq, Eq)]
struct ContactLink {
  label: &'static str,
  display: String,
  url: String,
}

/// Static contact details for the people running the directory
pub struct ContactView {
  links: Vec<ContactLink>,
  list_state: ListState,
}

impl ContactView {
  pub fn new(contact: &ContactConfig) -> Self {
    Self {
      links: links(contact),
      list_state: ListState::default(),
    }
  }
}

fn links(contact: &ContactConfig) -> Vec<ContactLink> {
  let digits = |n: &str| -> String { n.chars().filter(char::is_ascii_digit).collect() };
  let mut links = Vec::new();

  if let Some(phone) = contact.phone.as_deref().and_then(|p| phone_numbers(p).into_iter().next()) {
    links.push(ContactLink {
      label: "Phone",
      url: format!("tel:+{}", digits(phone.as_str())),
      display: phone,
    });
  }
  if let Some(email) = contact.email.as_deref().filter(|e| !e.trim().is_empty()) {
    links.push(ContactLink {
      label: "Email",
      display: email.trim().to_string(),
      url: format!("mailto:{}", email.trim()),
    });
  }
  if let Some(handle) = contact.instagram.as_deref().filter(|h| !h.trim().is_empty()) {
    let handle = handle.trim().trim_start_matches('@');
    links.push(ContactLink {
      label: "Instagram",
      display: format!("@{}", handle),
      url: format!("https://instagram.com/{}", handle),
    });
  }
  if let Some(number) = contact.whatsapp.as_deref().filter(|n| !digits(*n).is_empty()) {
    links.push(ContactLink {
      label: "WhatsApp",
      display: number.trim().to_string(),
      url: format!("https://wa.me/{}", digits(number)),
    });
  }

  links
}

impl View for ContactView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Enter => {
        if let Some(link) = self.list_state.selected().and_then(|i| self.links.get(i)) {
          return ViewAction::Notify(Notice::Info(link.url.clone()));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    ensure_valid_selection(&mut self.list_state, self.links.len());

    let block = Block::default()
      .title(" Contact Us ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.links.is_empty() {
      let hint = "No contact details configured. Add a `contact:` section to the config file.";
      let paragraph = Paragraph::new(hint)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .links
      .iter()
      .map(|link| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<10}", link.label), Style::default().fg(Color::Yellow)),
          Span::raw(link.display.clone()),
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

  fn breadcrumb_label(&self) -> String {
    "Contact".to_string()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("enter", "show link").with_priority(20),
      Shortcut::new("q", "back").with_priority(40),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::views::testing::{key, render_to_string};

  fn contact() -> ContactConfig {
    ContactConfig {
      phone: Some("+996 555 000 000".to_string()),
      email: Some("hello@example.com".to_string()),
      instagram: Some("@placebook".to_string()),
      whatsapp: Some("".to_string()),
    }
  }

  #[test]
  fn test_links_skip_blank_entries() {
    let links = links(&contact());
    let labels: Vec<&str> = links.iter().map(|l| l.label).collect();
    assert_eq!(labels, vec!["Phone", "Email", "Instagram"]);
    assert_eq!(links[0].url, "tel:+996555000000");
    assert_eq!(links[2].url, "https://instagram.com/placebook");
  }

  #[test]
  fn test_enter_shows_selected_link() {
    let mut view = ContactView::new(&contact());
    render_to_string(&mut view, 60, 8);
    view.handle_key(key(KeyCode::Down));

    match view.handle_key(key(KeyCode::Enter)) {
      ViewAction::Notify(Notice::Info(url)) => assert_eq!(url, "mailto:hello@example.com"),
      _ => panic!("expected a notice"),
    }
  }

  #[test]
  fn test_unconfigured_contact_explains() {
    let mut view = ContactView::new(&ContactConfig::default());
    let screen = render_to_string(&mut view, 120, 5);
    assert!(screen.contains("No contact details configured"));
  }
}
