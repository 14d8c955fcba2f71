use std::fmt;

use tracing::{debug, info};

use crate::core::{Catalog, PageDecodeError, PageResponse, Query, Rule};

mod http;

pub use http::{HttpOptions, HttpPageSource};

#[derive(Debug)]
pub enum TransportError {
    Request {
        page: u32,
        message: String,
    },
    Status {
        page: u32,
        code: u16,
        status_text: String,
    },
    Decode {
        page: u32,
        source: PageDecodeError,
    },
}

impl TransportError {
    pub fn page(&self) -> u32 {
        match self {
            TransportError::Request { page, .. }
            | TransportError::Status { page, .. }
            | TransportError::Decode { page, .. } => *page,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Request { page, message } => {
                write!(f, "ページ {page} の取得に失敗しました: {message}")
            }
            TransportError::Status {
                page,
                code,
                status_text,
            } => write!(
                f,
                "ページ {page} の取得に失敗しました: HTTP {code} {status_text}"
            ),
            TransportError::Decode { page, .. } => {
                write!(f, "ページ {page} の応答を解釈できませんでした")
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub trait PageSource {
    fn fetch_page(&mut self, query: &Query, page: u32) -> Result<PageResponse, TransportError>;
}

impl<F> PageSource for F
where
    F: FnMut(&Query, u32) -> Result<PageResponse, TransportError>,
{
    fn fetch_page(&mut self, query: &Query, page: u32) -> Result<PageResponse, TransportError> {
        self(query, page)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub show_progress: bool,
}

pub struct CatalogFetcher<S> {
    source: S,
    opts: FetchOptions,
}

impl<S: PageSource> CatalogFetcher<S> {
    pub fn new(source: S, opts: FetchOptions) -> Self {
        Self { source, opts }
    }

    pub fn fetch(&mut self, query: &Query) -> Result<Vec<Rule>, TransportError> {
        use std::io::IsTerminal;
        let pb = if self.opts.show_progress && std::io::stderr().is_terminal() {
            Some(crate::ui::spinner("ルールを取得中..."))
        } else {
            None
        };

        let result = self.collect(query, pb.as_ref());

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        result.map(Catalog::into_rules)
    }

    fn collect(
        &mut self,
        query: &Query,
        pb: Option<&indicatif::ProgressBar>,
    ) -> Result<Catalog, TransportError> {
        let mut catalog = Catalog::default();
        let mut page: u32 = 0;

        loop {
            page += 1;
            if let Some(pb) = pb {
                if page == 1 {
                    pb.set_message("ページ 1 を取得中...".to_string());
                } else {
                    let expected = catalog.total_pages(query.page_size) + 1;
                    pb.set_message(format!("ページ {page}/{expected} を取得中..."));
                }
            }

            debug!(uri = %query.base_uri, page, "requesting page");
            let response = self.source.fetch_page(query, page)?;
            let received = response.rules.len();
            catalog.merge(page, response);

            // The bound follows the latest reported total, so it may move between pages.
            let total_pages = catalog.total_pages(query.page_size);
            info!(
                page,
                received,
                total = catalog.total,
                collected = catalog.rules.len(),
                "ページを取得しました"
            );

            if u64::from(page) > total_pages {
                break;
            }
        }

        Ok(catalog)
    }
}
