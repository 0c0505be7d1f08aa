use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::parser::HtmlParser;
use crate::site::SiteClient;

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub site: SiteClient,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_options(
            &config.download.user_agent,
            config.download.timeout(),
        )?);
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        let parser = Arc::new(HtmlParser::new(&config.parser)?);
        let site = SiteClient::new(fetcher.clone(), parser);

        Ok(Self {
            config,
            fetcher,
            site,
        })
    }
}
