//! Douban FM endpoints.
//!
//! The endpoint family is a closed enum. Every match below is exhaustive, so a
//! new case won't compile until it has a path and parameters of its own.

use serde_json::json;

use crate::network::endpoint::{Endpoint, Params};

pub const DEFAULT_HOST: &str = "https://api.douban.com/";
pub const DEFAULT_APP_NAME: &str = "radio_iphone";
pub const DEFAULT_VERSION: &str = "115";

/// One logical Douban FM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DouBanApi {
    /// Channel groups shown on the app's home screen.
    Channels,
    /// Next songs for a channel.
    Playlist { channel: u32 },
    /// Resolves to no URL. Exercises the failure path without touching the network.
    InvalidUrl,
}

/// Client identity sent with every Douban request.
#[derive(Debug, Clone, PartialEq)]
pub struct DouBanSettings {
    pub host: String,
    pub api_key: Option<String>,
    pub app_name: String,
    pub version: String,
    pub udid: Option<String>,
    /// Device descriptor the mobile apps send, `s:mobile|y:<os>|f:<version>|...`.
    pub client: Option<String>,
    pub douban_udid: Option<String>,
}

impl Default for DouBanSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            api_key: None,
            app_name: DEFAULT_APP_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            udid: None,
            client: None,
            douban_udid: None,
        }
    }
}

impl DouBanSettings {
    pub fn endpoint(&self, api: DouBanApi) -> DouBanEndpoint<'_> {
        DouBanEndpoint { api, settings: self }
    }

    fn identity(&self) -> Params {
        let mut params = Params::new();
        params.insert("alt".into(), json!("json"));
        params.insert("app_name".into(), json!(self.app_name));
        params.insert("version".into(), json!(self.version));
        if let Some(key) = &self.api_key {
            params.insert("apikey".into(), json!(key));
        }
        if let Some(udid) = &self.udid {
            params.insert("udid".into(), json!(udid));
        }
        if let Some(client) = &self.client {
            params.insert("client".into(), json!(client));
        }
        if let Some(douban_udid) = &self.douban_udid {
            params.insert("douban_udid".into(), json!(douban_udid));
        }
        params
    }
}

/// A [`DouBanApi`] call bound to the settings it is sent with.
#[derive(Debug, Clone, Copy)]
pub struct DouBanEndpoint<'a> {
    pub api: DouBanApi,
    settings: &'a DouBanSettings,
}

impl Endpoint for DouBanEndpoint<'_> {
    fn host(&self) -> &str {
        &self.settings.host
    }

    fn path(&self) -> &str {
        match self.api {
            DouBanApi::Channels => "v2/fm/app_channels",
            DouBanApi::Playlist { .. } => "v2/fm/playlist",
            DouBanApi::InvalidUrl => "",
        }
    }

    fn parameters(&self) -> Option<Params> {
        match self.api {
            DouBanApi::Channels => {
                let mut params = self.settings.identity();
                params.insert("icon_cate".into(), json!("xlarge"));
                Some(params)
            }
            DouBanApi::Playlist { channel } => {
                let mut params = self.settings.identity();
                params.insert("channel".into(), json!(channel.to_string()));
                params.insert("formats".into(), json!("aac"));
                params.insert("kbps".into(), json!("128"));
                params.insert("pt".into(), json!("0.0"));
                params.insert("type".into(), json!("n"));
                Some(params)
            }
            DouBanApi::InvalidUrl => None,
        }
    }

    fn url(&self) -> Option<String> {
        match self.api {
            DouBanApi::InvalidUrl => None,
            DouBanApi::Channels | DouBanApi::Playlist { .. } => {
                Some(format!("{}{}", self.host(), self.path()))
            }
        }
    }
}
