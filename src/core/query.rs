use anyhow::{Context, Result};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

pub const DEFAULT_PAGE_SIZE: u32 = 500;

const CUTOFF_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub base_uri: String,
    pub language: String,
    pub available_since: Option<Date>,
    pub page_size: u32,
}

impl Query {
    pub fn new(base_uri: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            language: language.into(),
            available_since: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_available_since(mut self, date: Option<Date>) -> Self {
        self.available_since = date;
        self
    }

    pub fn params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("languages", self.language.clone()),
            ("ps", self.page_size.to_string()),
            ("p", page.to_string()),
        ];
        if let Some(date) = self.available_since {
            params.push(("available_since", format_cutoff_date(date)));
        }
        params
    }
}

pub fn parse_cutoff_date(s: &str) -> Result<Date> {
    let s = s.trim();
    Date::parse(s, CUTOFF_DATE_FORMAT)
        .with_context(|| format!("日付が不正です: {s}（YYYY-MM-DD で指定してください）"))
}

pub fn format_cutoff_date(date: Date) -> String {
    date.format(CUTOFF_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}
