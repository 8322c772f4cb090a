use serde::{Deserialize, Serialize};

/// One scraped and translated chapter as stored in the data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u32,
    pub original_title: String,
    pub title: String,
    pub content: String,
    pub url: String,
}
