use std::fmt;
use std::io::Read;

use serde::Deserialize;

use crate::core::Rule;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResponse {
    pub page: Option<u32>,
    pub total: u64,
    pub rules: Vec<Rule>,
}

#[derive(Debug)]
pub enum PageDecodeError {
    Json(serde_json::Error),
    MissingTotal,
}

impl fmt::Display for PageDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageDecodeError::Json(err) => write!(f, "JSON の解析に失敗しました: {err}"),
            PageDecodeError::MissingTotal => f.write_str("応答に total がありません"),
        }
    }
}

impl std::error::Error for PageDecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PageDecodeError::Json(err) => Some(err),
            PageDecodeError::MissingTotal => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPage {
    p: Option<u32>,
    total: Option<u64>,
    paging: Option<RawPaging>,
    rules: Option<Vec<Rule>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPaging {
    page_index: Option<u32>,
    total: Option<u64>,
}

impl PageResponse {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PageDecodeError> {
        let raw: RawPage = serde_json::from_reader(reader).map_err(PageDecodeError::Json)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawPage) -> Result<Self, PageDecodeError> {
        let paging = raw.paging.as_ref();
        let total = raw
            .total
            .or_else(|| paging.and_then(|p| p.total))
            .ok_or(PageDecodeError::MissingTotal)?;
        let page = raw.p.or_else(|| paging.and_then(|p| p.page_index));
        Ok(Self {
            page,
            total,
            rules: raw.rules.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub page: u32,
    pub total: u64,
    pub rules: Vec<Rule>,
}

impl Catalog {
    pub fn merge(&mut self, requested_page: u32, response: PageResponse) {
        self.page = response.page.unwrap_or(requested_page);
        self.total = response.total;
        self.rules.extend(response.rules);
    }

    pub fn total_pages(&self, page_size: u32) -> u64 {
        self.total / u64::from(page_size.max(1))
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }
}
