//! Douban FM response models.

use reqwest::Url;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub id: i64,
    #[serde(default)]
    pub cover: Option<String>,
}

impl Channel {
    /// Cover image URL, if the channel has a usable one.
    pub fn cover_url(&self) -> Option<Url> {
        Url::parse(self.cover.as_deref()?).ok()
    }
}

/// A named group of channels on the home screen.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Group {
    #[serde(default)]
    pub chls: Vec<Channel>,
    pub group_id: i64,
    #[serde(default)]
    pub group_name: Option<String>,
}
