use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};

use crate::app::{PartyError, Result};
use crate::domain::{service_from_link, CreatorInfo, PostContent, PostReference};
use crate::parser::{PageParser, ParserConfig};

const PUBLISHED_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Selector-driven parser for the coomer/kemono page layout
pub struct HtmlParser {
    creator_link: Selector,
    creator_name: Selector,
    paginator: Selector,
    post_list: Selector,
    description: Selector,
    published: Selector,
    file_groups: Vec<Selector>,
    anchor: Selector,
}

impl HtmlParser {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            creator_link: selector(&config.creator_link)?,
            creator_name: selector(&config.creator_name)?,
            paginator: selector(&config.paginator)?,
            post_list: selector(&config.post_list)?,
            description: selector(&config.description)?,
            published: selector(&config.published)?,
            file_groups: config
                .file_groups
                .iter()
                .map(|s| selector(s))
                .collect::<Result<Vec<_>>>()?,
            anchor: selector("a")?,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(&ParserConfig::default())
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PartyError::Parse(format!("invalid selector {:?}: {}", css, e)))
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

fn child_elements<'a>(parent: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    parent.children().filter_map(ElementRef::wrap)
}

/// Parse a "<label>: YYYY-MM-DD HH:MM:SS" line as UTC.
pub fn parse_published(text: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    let (_, value) = text
        .split_once(':')
        .ok_or_else(|| PartyError::Parse(format!("published line without label: {:?}", text.trim())))?;

    NaiveDateTime::parse_from_str(value.trim(), PUBLISHED_LAYOUT)
        .map(|dt| dt.and_utc())
        .map_err(|e| PartyError::Parse(format!("invalid publish date {:?}: {}", value.trim(), e)))
}

impl PageParser for HtmlParser {
    fn parse_creator(&self, body: &str) -> Result<CreatorInfo> {
        let document = Html::parse_document(body);

        let link = document
            .select(&self.creator_link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| PartyError::Parse("creator link not found".into()))?;

        let name = first_text(&document, &self.creator_name)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| PartyError::Parse("creator name not found".into()))?;

        let paginator = first_text(&document, &self.paginator)
            .ok_or_else(|| PartyError::Parse("paginator not found".into()))?;
        let posts = paginator
            .split_whitespace()
            .last()
            .and_then(|count| count.parse::<u32>().ok())
            .ok_or_else(|| PartyError::Parse(format!("invalid paginator: {:?}", paginator.trim())))?;

        Ok(CreatorInfo::new(&name, service_from_link(link), link, posts))
    }

    fn parse_listing(&self, body: &str) -> Result<Vec<PostReference>> {
        let document = Html::parse_document(body);

        let list = document
            .select(&self.post_list)
            .next()
            .ok_or_else(|| PartyError::Parse("post list not found".into()))?;

        let posts = child_elements(list)
            .filter_map(|card| child_elements(card).next())
            .filter_map(|a| a.value().attr("href"))
            .map(PostReference::new)
            .collect();

        Ok(posts)
    }

    fn parse_post(&self, body: &str) -> Result<PostContent> {
        let document = Html::parse_document(body);

        let description = first_text(&document, &self.description).unwrap_or_default();

        let published = first_text(&document, &self.published)
            .ok_or_else(|| PartyError::Parse("published date not found".into()))?;
        let published = parse_published(&published)?;

        let mut download_urls = Vec::new();
        for group in &self.file_groups {
            let Some(container) = document.select(group).next() else {
                continue;
            };
            for entry in child_elements(container) {
                if let Some(href) = entry
                    .select(&self.anchor)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                {
                    download_urls.push(href.to_string());
                }
            }
        }

        Ok(PostContent {
            download_urls,
            description,
            published,
        })
    }
}
