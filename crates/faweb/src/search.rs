//! Site-wide submission search.

use faweb_extract::Walker;
use scraper::Html;

use crate::client::Client;
use crate::error::Result;
use crate::handlers::{GallerySection, ScriptData};
use crate::submission::{Rating, Submission};

impl Client {
    pub fn search(&self, query: impl Into<String>) -> Search<'_> {
        Search {
            client: self,
            query: query.into(),
        }
    }
}

/// A prepared search; each call to [`Search::page`] posts the query form
/// for one result page.
#[derive(Debug)]
pub struct Search<'a> {
    client: &'a Client,
    query: String,
}

impl<'a> Search<'a> {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// One page of search results. Pages are 1-based; 0 is read as 1.
    pub async fn page(&self, page: u32) -> Result<Vec<Submission<'a>>> {
        let page = page.max(1).to_string();
        log::debug!("searching {:?} page {page}", self.query);

        // The site wants the full toggle set spelled out on every query.
        let form: [(&str, &str); 17] = [
            ("q", &self.query),
            ("page", &page),
            ("perpage", "72"),
            ("order-by", "date"),
            ("order-direction", "desc"),
            ("do_search", "Search"),
            ("range", "all"),
            ("rating-general", "on"),
            ("rating-mature", "on"),
            ("rating-adult", "on"),
            ("type-art", "on"),
            ("type-flash", "on"),
            ("type-photo", "on"),
            ("type-music", "on"),
            ("type-story", "on"),
            ("type-poetry", "on"),
            ("mode", "extended"),
        ];

        let html = self.client.post_html("/search/", &form).await?;
        Ok(self.extract_results(&html))
    }

    /// Search figures carry captions, so the DOM-derived title and owner
    /// win on this page type; the embedded blob only backfills and
    /// provides the preferred rating encoding.
    fn extract_results(&self, html: &Html) -> Vec<Submission<'a>> {
        let mut results = GallerySection::new("gallery-search-results");
        let mut scripts = ScriptData::descriptions();
        Walker::new(vec![&mut results, &mut scripts]).walk(html.tree.root());

        results
            .records
            .into_iter()
            .map(|figure| {
                let entry = scripts.data.get(&figure.key);
                let title = figure
                    .title
                    .filter(|t| !t.is_empty())
                    .or_else(|| entry.map(|e| e.title.clone()))
                    .unwrap_or_default();
                let user = figure
                    .user
                    .filter(|u| !u.is_empty())
                    .or_else(|| entry.map(|e| e.username.clone()))
                    .unwrap_or_default();
                let rating = entry
                    .and_then(|e| Rating::from_token(&e.icon_rating))
                    .or(figure.rating);
                Submission::assemble(
                    self.client,
                    figure.id,
                    figure.preview_url.unwrap_or_default(),
                    rating,
                    title,
                    user,
                )
            })
            .collect()
    }
}
