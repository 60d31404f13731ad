use crate::ui::view::Notice;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar: view breadcrumb on the left, status notice on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], notice: Option<&Notice>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };
    spans.push(Span::styled(part.clone(), style));
  }

  let background = Style::default().bg(Color::Black);
  frame.render_widget(Paragraph::new(Line::from(spans)).style(background), area);

  if let Some(notice) = notice {
    let color = match notice {
      Notice::Info(_) => Color::Green,
      Notice::Error(_) => Color::Red,
    };
    let text = Line::from(Span::styled(
      format!("{} ", notice.text()),
      Style::default().fg(color),
    ))
    .alignment(Alignment::Right);
    frame.render_widget(Paragraph::new(text), area);
  }
}
