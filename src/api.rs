use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::scrape::{self, Album, Track};
use crate::settings::AppSettings;

/// Listing categories the site exposes as fixed URL paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Latest,
    Top40,
    NewlyAdded,
    MostFavorites,
}

impl Category {
    pub fn as_path(&self) -> &'static str {
        match self {
            Category::Latest => "",
            Category::Top40 => "/game-soundtracks/browse/top-40",
            Category::NewlyAdded => "/game-soundtracks/browse/newly-added",
            Category::MostFavorites => "/game-soundtracks/browse/most-favorites",
        }
    }
}

pub struct KhinsiderClient {
    http: Client,
    base_url: String,
}

impl KhinsiderClient {
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .timeout(Duration::from_secs(10));
        if let Some(proxy) = settings.proxy_url() {
            builder = builder.proxy(reqwest::Proxy::all(&proxy).context("configure proxy")?);
        }
        Ok(Self {
            http: builder.build().context("build http client")?,
            base_url: crate::settings::normalize_host(&settings.host_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Albums from a category listing, up to `limit`. Fail-soft: network or
    /// parse errors are logged and yield an empty list.
    pub async fn fetch_albums_by_category(&self, category: Category, limit: usize) -> Vec<Album> {
        match self.try_fetch_albums(category, limit).await {
            Ok(albums) => albums,
            Err(e) => {
                log::warn!("fetching {:?} albums failed: {:#}", category, e);
                vec![]
            }
        }
    }

    /// Alias for the `latest` category.
    pub async fn fetch_latest_albums(&self, limit: usize) -> Vec<Album> {
        self.fetch_albums_by_category(Category::Latest, limit).await
    }

    /// Track listing from an album page. Same fail-soft contract.
    pub async fn fetch_album_tracks(&self, album_url: &str) -> Vec<Track> {
        match self.try_fetch_tracks(album_url).await {
            Ok(tracks) => tracks,
            Err(e) => {
                log::warn!("fetching tracks from {} failed: {:#}", album_url, e);
                vec![]
            }
        }
    }

    /// All cover image links from an album page. Same fail-soft contract.
    pub async fn fetch_album_covers(&self, album_url: &str) -> Vec<String> {
        match self.try_fetch_covers(album_url).await {
            Ok(covers) => covers,
            Err(e) => {
                log::warn!("fetching covers from {} failed: {:#}", album_url, e);
                vec![]
            }
        }
    }

    /// Main cover image from an album page, when it has one.
    pub async fn fetch_album_cover(&self, album_url: &str) -> Option<String> {
        match self.try_fetch_main_cover(album_url).await {
            Ok(cover) => cover,
            Err(e) => {
                log::warn!("fetching cover from {} failed: {:#}", album_url, e);
                None
            }
        }
    }

    async fn try_fetch_albums(&self, category: Category, limit: usize) -> Result<Vec<Album>> {
        let url = format!("{}{}", self.base_url, category.as_path());
        let html = self.get_text(&url).await?;
        let doc = Html::parse_document(&html);
        Ok(scrape::parse_album_table(&doc, &self.base_url, limit)?)
    }

    async fn try_fetch_tracks(&self, album_url: &str) -> Result<Vec<Track>> {
        let html = self.get_text(album_url).await?;
        let doc = Html::parse_document(&html);
        Ok(scrape::parse_track_table(&doc)?)
    }

    async fn try_fetch_covers(&self, album_url: &str) -> Result<Vec<String>> {
        let html = self.get_text(album_url).await?;
        let doc = Html::parse_document(&html);
        Ok(scrape::parse_cover_links(&doc, &self.base_url))
    }

    async fn try_fetch_main_cover(&self, album_url: &str) -> Result<Option<String>> {
        let html = self.get_text(album_url).await?;
        let doc = Html::parse_document(&html);
        Ok(scrape::parse_main_cover(&doc, &self.base_url))
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
            .with_context(|| format!("fetch {}", url))
    }
}
