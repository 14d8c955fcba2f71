mod catalog;
mod query;
mod rule;

pub use catalog::{Catalog, PageDecodeError, PageResponse};
pub use query::{DEFAULT_PAGE_SIZE, Query, format_cutoff_date, parse_cutoff_date};
pub use rule::Rule;
