use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::Deserialize;

use crate::core::Rule;

mod columns;
mod output;
mod xlsx;

pub use columns::{CellValue, Column, DEFAULT_COLUMNS, Table, parse_rule_date};
pub use output::{DEFAULT_FILE_PREFIX, DEFAULT_FILE_SUFFIX, write_output};
pub use xlsx::{SHEET_NAME, column_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Plain,
    Table,
}

impl Layout {
    pub const fn as_str(self) -> &'static str {
        match self {
            Layout::Plain => "plain",
            Layout::Table => "table",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Layout::Plain),
            "table" => Ok(Layout::Table),
            other => Err(format!(
                "レイアウトが不正です: {other}（plain|table を指定してください）"
            )),
        }
    }
}

pub fn export(rules: &[Rule], columns: &[String], layout: Layout) -> Result<Vec<u8>> {
    let table = Table::build(rules, columns);
    xlsx::to_bytes(&table, layout)
}
