use chrono::{DateTime, Utc};

use crate::query::{Query, QueryState};

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Human-friendly age of a fetch, rounded to the nearest unit
pub fn age_display(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let minutes = (now - fetched_at).num_minutes();
  if minutes < 1 {
    // Includes clock skew
    "just now".to_string()
  } else if minutes < 60 {
    format!("{}m ago", minutes)
  } else if minutes < 1440 {
    let hours = minutes / 60;
    if minutes % 60 >= 30 {
      format!("{}h ago", hours + 1)
    } else {
      format!("{}h ago", hours)
    }
  } else {
    let days = minutes / 1440;
    if (minutes % 1440) / 60 >= 12 {
      format!("{}d ago", days + 1)
    } else {
      format!("{}d ago", days)
    }
  }
}

/// Short label describing where the data on screen stands, for view titles
pub fn freshness<T: Clone + Send + 'static>(query: &Query<T>, now: DateTime<Utc>) -> String {
  let age = query
    .fetched_at()
    .map(|at| age_display(at, now))
    .unwrap_or_default();

  match query.state() {
    QueryState::Idle => String::new(),
    QueryState::Loading => "loading...".to_string(),
    QueryState::Empty => "offline".to_string(),
    QueryState::Stale(_) if query.is_refreshing() => format!("refreshing, cached {}", age),
    QueryState::Stale(_) if query.last_error().is_some() => format!("offline, cached {}", age),
    QueryState::Stale(_) => format!("cached {}", age),
    QueryState::Fresh(_) if query.is_refreshing() => "refreshing".to_string(),
    QueryState::Fresh(_) => format!("updated {}", age),
  }
}
