//! Per-user operations: recent activity and the paginated gallery,
//! scraps and journal listings.

use std::collections::HashMap;

use faweb_extract::Walker;
use scraper::Html;

use crate::client::Client;
use crate::error::Result;
use crate::handlers::{FigureRecord, GallerySection, JournalLinks, ScriptData, ScriptEntry};
use crate::journal::Journal;
use crate::submission::{Rating, Submission};

impl Client {
    pub fn user(&self, name: impl Into<String>) -> User<'_> {
        User {
            client: self,
            name: name.into(),
        }
    }
}

/// Handle on one site user; all operations fill the owning username from
/// this context, since the markup does not repeat it per item.
#[derive(Debug)]
pub struct User<'a> {
    client: &'a Client,
    name: String,
}

impl<'a> User<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The user's most recent submissions and journals, from the profile
    /// page.
    pub async fn recent(&self) -> Result<(Vec<Submission<'a>>, Vec<Journal<'a>>)> {
        log::debug!("retrieving recent activity for {}", self.name);
        let html = self.client.get_html(&format!("/user/{}", self.name)).await?;
        Ok(self.extract_recent(&html))
    }

    fn extract_recent(&self, html: &Html) -> (Vec<Submission<'a>>, Vec<Journal<'a>>) {
        let mut section = GallerySection::new("gallery-latest-submissions");
        let mut journals = JournalLinks::default();
        let mut scripts = ScriptData::submission_data();
        Walker::new(vec![&mut section, &mut journals, &mut scripts]).walk(html.tree.root());

        let submissions = self.merge_submissions(section.records, &scripts.data);
        let journals = journals
            .entries
            .into_iter()
            .map(|link| Journal::assemble(self.client, link.id, link.title, self.name.clone()))
            .collect();
        (submissions, journals)
    }

    /// One page of the user's gallery. Pages are 1-based; 0 is read as 1.
    pub async fn gallery(&self, page: u32) -> Result<Vec<Submission<'a>>> {
        self.folder("gallery", "gallery-gallery", page).await
    }

    /// One page of the user's scraps folder. Pages are 1-based; 0 is read
    /// as 1.
    pub async fn scraps(&self, page: u32) -> Result<Vec<Submission<'a>>> {
        self.folder("scraps", "gallery-scraps", page).await
    }

    async fn folder(
        &self,
        path: &str,
        section_id: &'static str,
        page: u32,
    ) -> Result<Vec<Submission<'a>>> {
        let page = page.max(1);
        log::debug!("retrieving {path} page {page} for {}", self.name);
        let html = self
            .client
            .get_html(&format!("/{path}/{}/{page}/", self.name))
            .await?;

        let mut section = GallerySection::new(section_id);
        let mut scripts = ScriptData::submission_data();
        Walker::new(vec![&mut section, &mut scripts]).walk(html.tree.root());
        Ok(self.merge_submissions(section.records, &scripts.data))
    }

    /// One page of the user's journal listing. Pages are 1-based; 0 is
    /// read as 1.
    pub async fn journals(&self, page: u32) -> Result<Vec<Journal<'a>>> {
        let page = page.max(1);
        log::debug!("retrieving journals page {page} for {}", self.name);
        let html = self
            .client
            .get_html(&format!("/journals/{}/{page}/", self.name))
            .await?;

        let mut links = JournalLinks::default();
        Walker::new(vec![&mut links]).walk(html.tree.root());
        Ok(links
            .entries
            .into_iter()
            .map(|link| Journal::assemble(self.client, link.id, link.title, self.name.clone()))
            .collect())
    }

    /// Joins DOM-derived figure records against the script mapping by the
    /// id string. Title and username come from the script data (falling
    /// back to this user for ownership); the rating prefers the script
    /// encoding over the figure's class token.
    fn merge_submissions(
        &self,
        records: Vec<FigureRecord>,
        data: &HashMap<String, ScriptEntry>,
    ) -> Vec<Submission<'a>> {
        records
            .into_iter()
            .map(|figure| {
                let entry = data.get(&figure.key);
                let title = entry.map(|e| e.title.clone()).unwrap_or_default();
                let user = entry
                    .map(|e| e.username.clone())
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| self.name.clone());
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
