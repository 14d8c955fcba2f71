use std::time::Duration;

use crate::core::{PageResponse, Query};
use crate::fetch::{PageSource, TransportError};

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpPageSource {
    agent: ureq::Agent,
}

impl HttpPageSource {
    pub fn new(opts: &HttpOptions) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(opts.timeout)
            .user_agent(concat!("rules-extract/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&mut self, query: &Query, page: u32) -> Result<PageResponse, TransportError> {
        let mut request = self.agent.get(&query.base_uri);
        for (name, value) in query.params(page) {
            request = request.query(name, &value);
        }

        let response = request.call().map_err(|err| match err {
            ureq::Error::Status(code, response) => TransportError::Status {
                page,
                code,
                status_text: response.status_text().to_string(),
            },
            ureq::Error::Transport(transport) => TransportError::Request {
                page,
                message: transport.to_string(),
            },
        })?;

        PageResponse::from_reader(response.into_reader())
            .map_err(|source| TransportError::Decode { page, source })
    }
}
