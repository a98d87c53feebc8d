//! Site-specific extraction handlers shared across page types.
//!
//! Each handler implements the [`faweb_extract::Handler`] capability pair
//! and owns its accumulator state; section handlers compose by running a
//! fresh [`Walker`] over their matched subtree.

use std::collections::HashMap;

use ego_tree::NodeRef;
use faweb_extract::node::{attr, has_tag_id, is_tag};
use faweb_extract::{Handler, Walker};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Node;
use serde::Deserialize;

use crate::submission::{parse_submission_id, Rating};

static SUBMISSION_DATA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var submission_data = (.*}});").unwrap());
static DESCRIPTIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var descriptions = (.*}});").unwrap());
static JOURNAL_HREF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/journal/(\d+)/$").unwrap());

/// Per-submission payload embedded as a script literal, keyed by the
/// submission id string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ScriptEntry {
    pub icon_rating: String,
    pub title: String,
    pub username: String,
}

/// Extracts the JSON object assigned to a known script variable.
///
/// Malformed JSON is logged and degrades to an empty mapping; the merge
/// step then leaves the affected fields blank instead of failing the page.
pub(crate) struct ScriptData {
    re: &'static Regex,
    pub data: HashMap<String, ScriptEntry>,
}

impl ScriptData {
    /// Shape used on user pages: `var submission_data = ({...});`
    pub fn submission_data() -> Self {
        Self {
            re: &SUBMISSION_DATA_RE,
            data: HashMap::new(),
        }
    }

    /// Shape used on search pages: `var descriptions = ({...});`
    pub fn descriptions() -> Self {
        Self {
            re: &DESCRIPTIONS_RE,
            data: HashMap::new(),
        }
    }
}

impl Handler for ScriptData {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        is_tag(node, "script")
            && node
                .first_child()
                .and_then(|c| c.value().as_text().map(|t| self.re.is_match(t)))
                .unwrap_or(false)
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        let text = match node.first_child().and_then(|c| c.value().as_text()) {
            Some(text) => text,
            None => return false,
        };
        if let Some(caps) = self.re.captures(text) {
            match serde_json::from_str(&caps[1]) {
                Ok(data) => self.data = data,
                Err(e) => log::error!("malformed embedded submission data: {e}"),
            }
        }
        false
    }
}

/// One DOM-derived submission cell, before the script-data merge.
#[derive(Debug, Default)]
pub(crate) struct FigureRecord {
    pub id: u64,
    /// Digits portion of the composite id attribute; join key against the
    /// script mapping.
    pub key: String,
    pub preview_url: Option<String>,
    pub rating: Option<Rating>,
    pub title: Option<String>,
    pub user: Option<String>,
}

/// Matches a gallery container by id and collects one record per figure
/// inside it, in document order.
pub(crate) struct GallerySection {
    id: &'static str,
    pub records: Vec<FigureRecord>,
}

impl GallerySection {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            records: Vec::new(),
        }
    }
}

impl Handler for GallerySection {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        has_tag_id(node, "section", self.id)
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        let mut figures = Figures::default();
        Walker::new(vec![&mut figures]).walk(node);
        self.records = figures.records;
        false
    }
}

#[derive(Default)]
pub(crate) struct Figures {
    pub records: Vec<FigureRecord>,
}

impl Handler for Figures {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        is_tag(node, "figure")
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        let raw = attr(node, "id").unwrap_or("");
        let key = raw.strip_prefix("sid-").unwrap_or(raw).to_string();
        let rating = node
            .value()
            .as_element()
            .and_then(|el| el.classes().find_map(Rating::from_token));

        let mut img = PreviewImg::default();
        let mut caption = Caption::default();
        Walker::new(vec![&mut img, &mut caption]).walk(node);

        self.records.push(FigureRecord {
            id: parse_submission_id(raw),
            key,
            preview_url: img.src,
            rating,
            title: caption.title,
            user: caption.user,
        });
        false
    }
}

/// First image source inside the matched subtree.
#[derive(Default)]
pub(crate) struct PreviewImg {
    pub src: Option<String>,
}

impl Handler for PreviewImg {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        is_tag(node, "img") && self.src.is_none()
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        self.src = attr(node, "src").map(absolute_url);
        false
    }
}

/// Figcaption anchors: the `/view/` link tooltip carries the title, the
/// `/user/` one the owner.
#[derive(Default)]
pub(crate) struct Caption {
    pub title: Option<String>,
    pub user: Option<String>,
}

impl Handler for Caption {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        is_tag(node, "figcaption")
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        let mut links = CaptionLinks::default();
        Walker::new(vec![&mut links]).walk(node);
        self.title = links.title;
        self.user = links.user;
        false
    }
}

#[derive(Default)]
struct CaptionLinks {
    title: Option<String>,
    user: Option<String>,
}

impl Handler for CaptionLinks {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        is_tag(node, "a")
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        if let (Some(href), Some(tooltip)) = (attr(node, "href"), attr(node, "title")) {
            if href.starts_with("/view/") {
                self.title = Some(tooltip.to_string());
            } else if href.starts_with("/user/") {
                self.user = Some(tooltip.to_string());
            }
        }
        false
    }
}

#[derive(Debug)]
pub(crate) struct JournalLink {
    pub id: u64,
    pub title: String,
}

/// Journal title anchors. The same href pattern is reused by decorative
/// links ("Comments …", "Read more...") which carry no title, so the
/// structural match is paired with a text-content exclusion.
#[derive(Default)]
pub(crate) struct JournalLinks {
    pub entries: Vec<JournalLink>,
}

impl Handler for JournalLinks {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        if !is_tag(node, "a") {
            return false;
        }
        let href = match attr(node, "href") {
            Some(href) => href,
            None => return false,
        };
        if !JOURNAL_HREF_RE.is_match(href) {
            return false;
        }
        match node.first_child().and_then(|c| c.value().as_text()) {
            Some(text) => {
                let text: &str = text;
                !text.starts_with("Comments ") && text != "Read more..."
            }
            None => false,
        }
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        let caps = match attr(node, "href").and_then(|href| JOURNAL_HREF_RE.captures(href)) {
            Some(caps) => caps,
            None => return false,
        };
        let id = match caps[1].parse() {
            Ok(id) => id,
            Err(e) => {
                log::error!("unparsable journal id in {:?}: {e}", &caps[0]);
                0
            }
        };
        let title = node
            .first_child()
            .and_then(|c| c.value().as_text())
            .map(|t| t.to_string())
            .unwrap_or_default();
        self.entries.push(JournalLink { id, title });
        false
    }
}

/// The fixed-id username anchor only present on logged-in pages.
#[derive(Default)]
pub(crate) struct MyUsername {
    pub name: Option<String>,
}

impl Handler for MyUsername {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        has_tag_id(node, "a", "my-username")
            && node
                .first_child()
                .map(|c| c.value().is_text())
                .unwrap_or(false)
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        self.name = node
            .first_child()
            .and_then(|c| c.value().as_text())
            .map(|t| t.trim().to_string());
        false
    }
}

/// Protocol-relative sources come back scheme-qualified.
pub(crate) fn absolute_url(href: &str) -> String {
    match href.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn walk_one(html: &Html, handler: &mut dyn Handler) {
        Walker::new(vec![handler]).walk(html.tree.root());
    }

    #[test]
    fn script_data_round_trip() {
        let html = Html::parse_document(
            r#"<html><body><script>var submission_data = {"123":{"icon_rating":"r-general","title":"Foo","username":"bar"}};</script></body></html>"#,
        );
        let mut scripts = ScriptData::submission_data();
        walk_one(&html, &mut scripts);

        let entry = scripts.data.get("123").expect("key 123");
        assert_eq!(Rating::from_token(&entry.icon_rating), Some(Rating::General));
        assert_eq!(entry.title, "Foo");
        assert_eq!(entry.username, "bar");
    }

    #[test]
    fn script_data_ignores_other_variables() {
        let html = Html::parse_document(
            r#"<html><body><script>var other_data = {"1":{}};</script></body></html>"#,
        );
        let mut scripts = ScriptData::submission_data();
        walk_one(&html, &mut scripts);
        assert!(scripts.data.is_empty());
    }

    #[test]
    fn malformed_script_json_degrades_to_empty() {
        let html = Html::parse_document(
            r#"<html><body><script>var submission_data = {"123":{"title" oops}};</script></body></html>"#,
        );
        let mut scripts = ScriptData::submission_data();
        walk_one(&html, &mut scripts);
        assert!(scripts.data.is_empty());
    }

    #[test]
    fn section_extracts_figures_in_document_order() {
        let html = Html::parse_document(
            r#"<html><body>
               <section id="gallery-latest-submissions">
                 <figure id="sid-1" class="r-general"><img src="//t/1.jpg"></figure>
                 <figure id="sid-2" class="r-adult"><img src="//t/2.jpg"></figure>
                 <figure id="sid-3"></figure>
               </section>
               <figure id="sid-9"><img src="//t/9.jpg"></figure>
               </body></html>"#,
        );
        let mut section = GallerySection::new("gallery-latest-submissions");
        walk_one(&html, &mut section);

        let ids: Vec<u64> = section.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(section.records[0].rating, Some(Rating::General));
        assert_eq!(section.records[1].rating, Some(Rating::Adult));
        assert_eq!(section.records[0].preview_url.as_deref(), Some("https://t/1.jpg"));
        assert!(section.records[2].preview_url.is_none());
        assert!(section.records[2].rating.is_none());
    }

    #[test]
    fn figure_with_unparsable_id_keeps_zero_sentinel() {
        let html = Html::parse_document(
            r#"<html><body><figure id="sid-abc"></figure><figure></figure></body></html>"#,
        );
        let mut figures = Figures::default();
        walk_one(&html, &mut figures);
        assert_eq!(figures.records.len(), 2);
        assert_eq!(figures.records[0].id, 0);
        assert_eq!(figures.records[0].key, "abc");
        assert_eq!(figures.records[1].id, 0);
        assert_eq!(figures.records[1].key, "");
    }

    #[test]
    fn caption_links_split_title_and_user() {
        let html = Html::parse_document(
            r#"<html><body><figure id="sid-7">
               <figcaption>
                 <a href="/view/7/" title="A Title">A…</a>
                 <a href="/user/someone/" title="someone">someone</a>
               </figcaption></figure></body></html>"#,
        );
        let mut figures = Figures::default();
        walk_one(&html, &mut figures);
        assert_eq!(figures.records[0].title.as_deref(), Some("A Title"));
        assert_eq!(figures.records[0].user.as_deref(), Some("someone"));
    }

    #[test]
    fn journal_links_keep_title_anchors_only() {
        let html = Html::parse_document(
            r#"<html><body>
               <a href="/journal/100/">An Actual Title</a>
               <a href="/journal/100/">Comments (3)</a>
               <a href="/journal/100/">Read more...</a>
               <a href="/journal/101/">Another</a>
               <a href="/journal/xyz/">Not a journal</a>
               <a href="/view/100/">Unrelated</a>
               </body></html>"#,
        );
        let mut journals = JournalLinks::default();
        walk_one(&html, &mut journals);

        let titles: Vec<&str> = journals.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["An Actual Title", "Another"]);
        assert_eq!(journals.entries[0].id, 100);
        assert_eq!(journals.entries[1].id, 101);
    }

    #[test]
    fn journal_comments_prefix_requires_trailing_space() {
        // "Comments" without the space separator is a legitimate title.
        let html = Html::parse_document(
            r#"<html><body><a href="/journal/5/">Comments</a></body></html>"#,
        );
        let mut journals = JournalLinks::default();
        walk_one(&html, &mut journals);
        assert_eq!(journals.entries.len(), 1);
    }

    #[test]
    fn my_username_anchor() {
        let html = Html::parse_document(
            r#"<html><body><a id="my-username" href="/user/me/">~me</a></body></html>"#,
        );
        let mut me = MyUsername::default();
        walk_one(&html, &mut me);
        assert_eq!(me.name.as_deref(), Some("~me"));

        let html = Html::parse_document(r#"<html><body><a href="/login">Log in</a></body></html>"#);
        let mut me = MyUsername::default();
        walk_one(&html, &mut me);
        assert!(me.name.is_none());
    }

    #[test]
    fn absolute_url_qualifies_protocol_relative() {
        assert_eq!(absolute_url("//example/x.jpg"), "https://example/x.jpg");
        assert_eq!(absolute_url("https://example/x.jpg"), "https://example/x.jpg");
        assert_eq!(absolute_url("/view/1/"), "/view/1/");
    }
}
