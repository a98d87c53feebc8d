//! Journal records and the journal page.

use std::fmt;

use ego_tree::NodeRef;
use faweb_extract::node::{has_tag_class, squash_whitespace, text_content};
use faweb_extract::{Handler, Walker};
use scraper::{Html, Node};
use tokio::sync::OnceCell;

use crate::client::Client;
use crate::error::Result;

/// A journal entry, identified on a listing page; its text is fetched
/// lazily from the journal's own page and cached on this instance.
pub struct Journal<'a> {
    client: &'a Client,
    pub id: u64,
    pub title: String,
    pub user: String,
    content: OnceCell<JournalContent>,
}

/// Posted-date string and normalized body text of a journal page.
#[derive(Debug, Clone, Default)]
pub struct JournalContent {
    pub posted: String,
    pub body: String,
}

impl fmt::Debug for Journal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journal")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("user", &self.user)
            .finish()
    }
}

impl fmt::Display for Journal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}

impl<'a> Journal<'a> {
    pub(crate) fn assemble(client: &'a Client, id: u64, title: String, user: String) -> Self {
        Self {
            client,
            id,
            title,
            user,
            content: OnceCell::new(),
        }
    }

    pub fn url(&self) -> String {
        self.client.url(&format!("/journal/{}/", self.id))
    }

    /// Body and posted date, fetched at most once per instance.
    pub async fn content(&self) -> Result<&JournalContent> {
        self.content
            .get_or_try_init(|| async {
                let html = self
                    .client
                    .get_html(&format!("/journal/{}/", self.id))
                    .await?;
                Ok(extract_content(&html))
            })
            .await
    }
}

fn extract_content(html: &Html) -> JournalContent {
    let mut body = JournalBody::default();
    let mut date = JournalDate::default();
    Walker::new(vec![&mut body, &mut date]).walk(html.tree.root());
    JournalContent {
        posted: date.text.unwrap_or_default(),
        body: body.text.unwrap_or_default(),
    }
}

#[derive(Default)]
struct JournalBody {
    text: Option<String>,
}

impl Handler for JournalBody {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        has_tag_class(node, "div", "journal-body")
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        self.text = Some(squash_whitespace(&text_content(node)));
        // the posted-date span can sit inside the body container
        true
    }
}

#[derive(Default)]
struct JournalDate {
    text: Option<String>,
}

impl Handler for JournalDate {
    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        has_tag_class(node, "span", "popup_date")
    }

    fn handle(&mut self, node: NodeRef<'_, Node>) -> bool {
        self.text = node
            .first_child()
            .and_then(|c| c.value().as_text())
            .map(|t| t.trim().to_string());
        true
    }
}
