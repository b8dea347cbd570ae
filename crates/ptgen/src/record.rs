// ABOUTME: The canonical Metadata Record, the typed per-site detail structs and the Search Result Item.
// ABOUTME: Records serialize flat: required fields first, then the site-specific fields at top level.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::formats;
use crate::site::Site;

/// Standard message for a subject the upstream reports as nonexistent.
pub const NONE_EXIST_ERROR: &str = "The corresponding resource does not exist.";

/// Message for douban's anti-automation interstitial.
pub const DOUBAN_BLOCKED_ERROR: &str = "GenHelp was temporary banned by Douban, Please wait....";

/// The normalized result of one extraction.
///
/// `success == true` implies `error == None` and a non-empty `format`;
/// `success == false` implies an error message and no site details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub site: Site,
    pub sid: String,
    pub success: bool,
    pub error: Option<String>,
    pub format: String,
    #[serde(flatten)]
    pub details: Option<SiteDetails>,
}

impl Record {
    /// A record for a subject the upstream says does not exist.
    pub fn not_found(site: Site, sid: impl Into<String>) -> Self {
        Self::failed(site, sid, NONE_EXIST_ERROR)
    }

    /// A record for an upstream that refused us as a bot.
    pub fn blocked(site: Site, sid: impl Into<String>, message: &str) -> Self {
        Self::failed(site, sid, message)
    }

    fn failed(site: Site, sid: impl Into<String>, message: &str) -> Self {
        Self {
            site,
            sid: sid.into(),
            success: false,
            error: Some(message.to_string()),
            format: String::new(),
            details: None,
        }
    }

    /// Finalize a successful extraction, rendering the formatted text.
    pub fn found(site: Site, sid: impl Into<String>, details: SiteDetails) -> Self {
        let format = formats::render_details(&details);
        Self {
            site,
            sid: sid.into(),
            success: true,
            error: None,
            format,
            details: Some(details),
        }
    }
}

/// Site-specific fields, one variant per extractor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SiteDetails {
    Douban(DoubanInfo),
    Imdb(ImdbInfo),
    Bangumi(BangumiInfo),
    Steam(SteamInfo),
    Indienova(IndienovaInfo),
    Epic(EpicInfo),
}

/// A person credited in JSON-LD (director, writer, actor...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoubanInfo {
    pub douban_link: String,
    pub chinese_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_title: Option<String>,
    pub aka: Vec<String>,
    pub trans_title: Vec<String>,
    pub this_title: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub region: Vec<String>,
    pub genre: Vec<String>,
    pub language: Vec<String>,
    pub playdate: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub introduction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub douban_rating_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub douban_votes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub douban_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_votes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub director: Vec<Credit>,
    pub writer: Vec<Credit>,
    pub cast: Vec<Credit>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,
}

/// One row of the IMDb release calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseDate {
    pub country: String,
    pub date: String,
}

/// One alternate title from the IMDb release page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AkaTitle {
    pub country: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImdbInfo {
    pub imdb_id: String,
    pub imdb_link: String,
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub genre: Vec<String>,
    #[serde(rename = "contentRating", skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,
    #[serde(rename = "datePublished", skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub actors: Vec<Credit>,
    pub directors: Vec<Credit>,
    pub creators: Vec<Credit>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_votes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metascore: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<String>,
    pub details: BTreeMap<String, String>,
    pub release_date: Vec<ReleaseDate>,
    pub aka: Vec<AkaTitle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BangumiInfo {
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub story: String,
    pub staff: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bangumi_votes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bangumi_rating_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bangumi_rating: Option<String>,
    pub tags: Vec<String>,
    pub cast: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SteamInfo {
    pub steam_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_chs: Option<String>,
    pub detail: String,
    pub tags: Vec<String>,
    pub review: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkbar: Option<String>,
    pub language: Vec<String>,
    pub descr: String,
    pub screenshot: Vec<String>,
    pub sysreq: Vec<String>,
}

/// A labelled outbound link on an indienova page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamedLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndienovaInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub chinese_title: String,
    pub another_title: String,
    pub english_title: String,
    pub release_date: String,
    pub links: Vec<NamedLink>,
    pub intro: String,
    pub intro_detail: Vec<String>,
    pub descr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    pub dev: Vec<String>,
    #[serde(rename = "pub")]
    pub publishers: Vec<String>,
    pub screenshot: Vec<String>,
    pub cat: Vec<String>,
    pub level: Vec<String>,
    pub price: Vec<String>,
}

/// Requirement lines for one operating system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemRequirements {
    pub system: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpicInfo {
    pub name: String,
    pub epic_link: String,
    pub desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub screenshot: Vec<String>,
    pub language: Vec<String>,
    pub min_req: Vec<SystemRequirements>,
    pub max_req: Vec<SystemRequirements>,
    pub level: Vec<String>,
}

/// A lightweight candidate returned by a search extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub link: String,
}
