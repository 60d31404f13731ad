//! Contact actions on a place: call, copy number, WhatsApp, maps.
//!
//! A terminal can't dial or open apps, so each action resolves to the number
//! or URL the user needs and the view shows it on the status line.

use thiserror::Error;

use crate::api::Item;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
  #[error("No phone number available")]
  NoPhoneNumber,

  #[error("No WhatsApp number available")]
  NoWhatsAppNumber,
}

/// What an action resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
  /// A number the user can dial or paste
  Number(String),
  /// A link the user can open
  Link(String),
}

impl std::fmt::Display for ActionOutcome {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ActionOutcome::Number(n) => write!(f, "{}", n),
      ActionOutcome::Link(url) => write!(f, "{}", url),
    }
  }
}

/// Split the free-form phone field into individual numbers.
///
/// Numbers may be separated by commas, semicolons, slashes or newlines.
pub fn phone_numbers(raw: &str) -> Vec<String> {
  raw
    .split([',', ';', '/', '\n'])
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .map(String::from)
    .collect()
}

/// First phone number as a `tel:` link.
pub fn call(item: &Item) -> Result<ActionOutcome, ActionError> {
  let number = primary_number(item)?;
  Ok(ActionOutcome::Link(format!("tel:{}", dial_digits(&number))))
}

/// First phone number as typed in the directory.
pub fn copy_number(item: &Item) -> Result<ActionOutcome, ActionError> {
  primary_number(item).map(ActionOutcome::Number)
}

/// WhatsApp chat link, falling back to the first phone number.
pub fn whatsapp(item: &Item) -> Result<ActionOutcome, ActionError> {
  let number = if item.whatsapp_number.trim().is_empty() {
    primary_number(item).map_err(|_| ActionError::NoWhatsAppNumber)?
  } else {
    item.whatsapp_number.trim().to_string()
  };

  let digits: String = number.chars().filter(char::is_ascii_digit).collect();
  if digits.is_empty() {
    return Err(ActionError::NoWhatsAppNumber);
  }

  Ok(ActionOutcome::Link(format!("https://wa.me/{}", digits)))
}

/// Maps link centered on the place.
pub fn open_in_maps(item: &Item) -> ActionOutcome {
  ActionOutcome::Link(maps_url(item.latitude, item.longitude))
}

pub fn maps_url(latitude: f64, longitude: f64) -> String {
  format!("https://maps.google.com/?q={},{}", latitude, longitude)
}

fn primary_number(item: &Item) -> Result<String, ActionError> {
  phone_numbers(&item.phone_numbers)
    .into_iter()
    .next()
    .ok_or(ActionError::NoPhoneNumber)
}

/// Keep a leading '+' and digits only.
fn dial_digits(number: &str) -> String {
  let plus = number.trim_start().starts_with('+');
  let digits: String = number.chars().filter(char::is_ascii_digit).collect();
  if plus {
    format!("+{}", digits)
  } else {
    digits
  }
}
