//! Display labels in the supported languages.

use chrono::Weekday;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  #[default]
  En,
  Ru,
}

impl std::str::FromStr for Language {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "en" | "english" => Ok(Language::En),
      "ru" | "russian" => Ok(Language::Ru),
      other => Err(format!("unsupported language '{}' (expected en or ru)", other)),
    }
  }
}

/// Labels used by the item, gallery and contact views
#[derive(Debug)]
pub struct Labels {
  pub overview: &'static str,
  pub working_hours: &'static str,
  pub location: &'static str,
  pub photos: &'static str,
  pub view_all: &'static str,
  pub call_now: &'static str,
  pub copy_number: &'static str,
  pub open_whatsapp: &'static str,
  pub open_in_maps: &'static str,
  pub closed: &'static str,
  pub no_description: &'static str,
  weekdays: [&'static str; 7],
}

static EN: Labels = Labels {
  overview: "Overview",
  working_hours: "Working Hours",
  location: "Location",
  photos: "Photos",
  view_all: "View all",
  call_now: "Call Now",
  copy_number: "Copy phone number",
  open_whatsapp: "Open in WhatsApp",
  open_in_maps: "Open in Maps",
  closed: "Closed",
  no_description: "No description",
  weekdays: [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
  ],
};

static RU: Labels = Labels {
  overview: "Обзор",
  working_hours: "Режим работы",
  location: "Расположение",
  photos: "Фотографии",
  view_all: "Показать все",
  call_now: "Позвонить",
  copy_number: "Скопировать номер",
  open_whatsapp: "Открыть в WhatsApp",
  open_in_maps: "Открыть в Картах",
  closed: "Закрыто",
  no_description: "Нет описания",
  weekdays: [
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
    "Воскресенье",
  ],
};

impl Language {
  pub fn labels(self) -> &'static Labels {
    match self {
      Language::En => &EN,
      Language::Ru => &RU,
    }
  }

  /// The other language, for the in-app toggle
  pub fn toggled(self) -> Self {
    match self {
      Language::En => Language::Ru,
      Language::Ru => Language::En,
    }
  }

  pub fn code(self) -> &'static str {
    match self {
      Language::En => "EN",
      Language::Ru => "RU",
    }
  }
}

impl Labels {
  pub fn weekday(&self, day: Weekday) -> &'static str {
    self.weekdays[day.num_days_from_monday() as usize]
  }
}
