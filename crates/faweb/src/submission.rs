//! Submission records and the submission details page.

use std::fmt;

use ego_tree::NodeRef;
use faweb_extract::node::{descend_path, has_tag_class, has_tag_id, is_tag, squash_whitespace, text_content};
use faweb_extract::{Handler, Walker};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use tokio::sync::OnceCell;

use crate::client::Client;
use crate::error::Result;
use crate::handlers::absolute_url;

/// Content rating of a submission.
///
/// Appears in two encodings: a CSS class token (`r-mature`) on gallery
/// figures and the `icon_rating` field of the embedded script data. Both
/// normalize through [`Rating::from_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    General,
    Mature,
    Adult,
}

impl Rating {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.strip_prefix("r-").unwrap_or(token) {
            "general" => Some(Self::General),
            "mature" => Some(Self::Mature),
            "adult" => Some(Self::Adult),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Mature => "mature",
            Self::Adult => "adult",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the numeric part of a composite `sid-<number>` id attribute.
///
/// Failure is logged and degrades to 0. The sentinel is ambiguous: a
/// genuine id 0 and a parse failure are indistinguishable downstream.
/// The site has produced neither so far.
pub(crate) fn parse_submission_id(raw: &str) -> u64 {
    let digits = raw.strip_prefix("sid-").unwrap_or(raw);
    match digits.parse() {
        Ok(id) => id,
        Err(e) => {
            log::error!("unparsable submission id {raw:?}: {e}");
            0
        }
    }
}

static PREVIEW_SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://t\.facdn\.net/(\d+)@(\d+)-(\d+)\.([a-zA-Z]+)$").unwrap()
});

/// For previews served below the large size, the URL of the `@400`
/// variant. `None` when the URL is already large or has a foreign shape.
fn large_preview_url(url: &str) -> Option<String> {
    let caps = PREVIEW_SIZE_RE.captures(url)?;
    if &caps[2] == "400" {
        return None;
    }
    Some(format!("https://t.facdn.net/{}@400-{}.{}", &caps[1], &caps[3], &caps[4]))
}

/// An artwork submission, assembled from one extraction pass.
///
/// Immutable apart from the preview cache, which is filled at most once
/// per instance; two instances with the same id fetch independently.
pub struct Submission<'a> {
    client: &'a Client,
    pub id: u64,
    pub preview_url: String,
    pub rating: Option<Rating>,
    pub title: String,
    pub user: String,
    preview: OnceCell<Vec<u8>>,
}

impl fmt::Debug for Submission<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("id", &self.id)
            .field("preview_url", &self.preview_url)
            .field("rating", &self.rating)
            .field("title", &self.title)
            .field("user", &self.user)
            .finish()
    }
}

impl fmt::Display for Submission<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {} ({})", self.title, self.user, self.id)
    }
}

impl<'a> Submission<'a> {
    pub(crate) fn assemble(
        client: &'a Client,
        id: u64,
        preview_url: String,
        rating: Option<Rating>,
        title: String,
        user: String,
    ) -> Self {
        Self {
            client,
            id,
            preview_url,
            rating,
            title,
            user,
            preview: OnceCell::new(),
        }
    }

    pub fn url(&self) -> String {
        self.client.url(&format!("/view/{}/", self.id))
    }

    /// Preview image bytes, fetched on first access and cached on this
    /// instance. Tries the large-size variant first and falls back to the
    /// provided URL.
    pub async fn preview_image(&self) -> Result<&[u8]> {
        let bytes = self
            .preview
            .get_or_try_init(|| async {
                if let Some(large) = large_preview_url(&self.preview_url) {
                    match self.client.get_bytes(&large).await {
                        Ok(bytes) => return Ok(bytes),
                        Err(e) => {
                            log::warn!(
                                "large preview fetch for submission {} failed, \
                                 falling back to provided size: {e}",
                                self.id
                            );
                        }
                    }
                }
                self.client.get_bytes(&self.preview_url).await
            })
            .await?;
        Ok(bytes)
    }

    /// Fetches the submission's own page and extracts its details.
    pub async fn details(&self) -> Result<SubmissionDetails<'a>> {
        let html = self.client.get_html(&format!("/view/{}/", self.id)).await?;
        Ok(extract_details(self.client, &html))
    }
}

/// Download link, description and stats recovered from a submission page.
pub struct SubmissionDetails<'a> {
    client: &'a Client,
    pub download_url: String,
    pub description: String,
    pub stats: String,
    file: OnceCell<Vec<u8>>,
}

impl fmt::Debug for SubmissionDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionDetails")
            .field("download_url", &self.download_url)
            .field("description", &self.description)
            .field("stats", &self.stats)
            .finish()
    }
}

impl SubmissionDetails<'_> {
    /// Raw download bytes, fetched at most once per instance. A page with
    /// no download link yields empty bytes rather than an error.
    pub async fn download(&self) -> Result<&[u8]> {
        let bytes = self
            .file
            .get_or_try_init(|| async {
                if self.download_url.is_empty() {
                    return Ok(Vec::new());
                }
                self.client.get_bytes(&self.download_url).await
            })
            .await?;
        Ok(bytes)
    }
}

fn extract_details<'a>(client: &'a Client, html: &Html) -> SubmissionDetails<'a> {
    let mut page = SubmissionPage::default();
    let mut download = DownloadLink::default();
    let mut stats = Stats::default();
    Walker::new(vec![&mut download, &mut stats, &mut page]).walk(html.tree.root());

    SubmissionDetails {
        client,
        download_url: download.url.unwrap_or_default(),
        description: page.description.unwrap_or_default(),
        stats: stats.text.unwrap_or_default(),
        file: OnceCell::new(),
    }
}

/// No id or class anchors the description cell; it sits at a fixed
/// position below the page container. The tbody steps are the ones HTML5
/// parsers insert.
const DESCRIPTION_PATH: &[(&str, usize)] = &[
    ("table", 1),
    ("tbody", 0),
    ("tr", 0),
    ("td", 0),
    ("table", 0),
    ("tbody", 0),
    ("tr", 1),
    ("td", 0),
];

#[derive(Default)]
struct SubmissionPage {
    description: Option<String>,
}

impl Handler for SubmissionPage {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        has_tag_id(node, "div", "page-submission")
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        if let Some(cell) = descend_path(node, DESCRIPTION_PATH) {
            self.description = Some(squash_whitespace(&text_content(cell)));
        }
        // the download link and stats block live inside this container
        true
    }
}

#[derive(Default)]
struct DownloadLink {
    url: Option<String>,
}

impl Handler for DownloadLink {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        is_tag(node, "a")
            && node
                .first_child()
                .and_then(|c| c.value().as_text().map(|t| &**t == "Download"))
                .unwrap_or(false)
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        self.url = faweb_extract::node::attr(node, "href").map(|href| absolute_url(href));
        false
    }
}

#[derive(Default)]
struct Stats {
    text: Option<String>,
}

impl Handler for Stats {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        has_tag_class(node, "td", "stats-container")
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        self.text = Some(squash_whitespace(&text_content(node)));
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client() -> Client {
        Client::new(Config::default()).unwrap()
    }

    #[test]
    fn rating_tokens_normalize_from_both_encodings() {
        assert_eq!(Rating::from_token("r-general"), Some(Rating::General));
        assert_eq!(Rating::from_token("r-mature"), Some(Rating::Mature));
        assert_eq!(Rating::from_token("adult"), Some(Rating::Adult));
        assert_eq!(Rating::from_token("t-image"), None);
        assert_eq!(Rating::from_token(""), None);
        assert_eq!(Rating::Mature.to_string(), "mature");
    }

    #[test]
    fn submission_id_parsing() {
        assert_eq!(parse_submission_id("sid-42"), 42);
        assert_eq!(parse_submission_id("sid-0"), 0);
        assert_eq!(parse_submission_id("1234567890"), 1234567890);
        // zero sentinel on anything unparsable
        assert_eq!(parse_submission_id("sid-"), 0);
        assert_eq!(parse_submission_id("sid-12a"), 0);
        assert_eq!(parse_submission_id(""), 0);
    }

    #[test]
    fn large_preview_upgrade() {
        assert_eq!(
            large_preview_url("https://t.facdn.net/123@200-99.jpg").as_deref(),
            Some("https://t.facdn.net/123@400-99.jpg")
        );
        // already large
        assert_eq!(large_preview_url("https://t.facdn.net/123@400-99.jpg"), None);
        // foreign shape
        assert_eq!(large_preview_url("https://example/x.jpg"), None);
    }

    #[test]
    fn details_extraction_from_fixed_path() {
        let client = client();
        let html = Html::parse_document(
            r#"<html><body><div id="page-submission">
               <table><tbody><tr><td>header</td></tr></tbody></table>
               <table><tbody><tr><td>
                 <table>
                   <tbody>
                     <tr><td>meta</td></tr>
                     <tr><td> The   description&nbsp;text </td></tr>
                   </tbody>
                 </table>
               </td></tr></tbody></table>
               <a href="//d.facdn.net/art/x/file.png">Download</a>
               <table><tbody><tr><td class="alt1 stats-container"> Views: 10
                  Comments: 2 </td></tr></tbody></table>
               </div></body></html>"#,
        );
        let details = extract_details(&client, &html);
        assert!(details.description.starts_with("The description"));
        assert_eq!(details.download_url, "https://d.facdn.net/art/x/file.png");
        assert!(details.stats.contains("Views: 10"));
    }

    #[test]
    fn details_survive_missing_structure() {
        let client = client();
        let html = Html::parse_document(
            r#"<html><body><div id="page-submission"><p>nothing here</p></div></body></html>"#,
        );
        let details = extract_details(&client, &html);
        assert!(details.description.is_empty());
        assert!(details.download_url.is_empty());
        assert!(details.stats.is_empty());
    }
}
