//! Page classification by frame URL.

use docarchiver_config::PagesConfig;
use regex::Regex;
use serde::Serialize;

use crate::error::AutomationError;

/// The pages the agent knows how to automate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PageKind {
    /// Pending documents with selection checkboxes and a review control.
    ListPage,
    /// Cascading file code / case sequence selects and a confirm control.
    ArchivePage,
    Unknown,
}

/// Maps a frame URL to a [`PageKind`]. Stateless.
#[derive(Debug, Clone)]
pub struct PageClassifier {
    list: Regex,
    archive: Regex,
}

impl PageClassifier {
    pub fn new(list_pattern: &str, archive_pattern: &str) -> Result<Self, AutomationError> {
        Ok(Self {
            list: Regex::new(list_pattern)?,
            archive: Regex::new(archive_pattern)?,
        })
    }

    pub fn from_config(pages: &PagesConfig) -> Result<Self, AutomationError> {
        Self::new(&pages.list_pattern, &pages.archive_pattern)
    }

    pub fn classify(&self, url: &str) -> PageKind {
        if self.list.is_match(url) {
            PageKind::ListPage
        } else if self.archive.is_match(url) {
            PageKind::ArchivePage
        } else {
            PageKind::Unknown
        }
    }
}
