// ABOUTME: Epic Games Store extractor reading the store content API document.
// ABOUTME: Merges the free-form language list and splits requirements into minimum and recommended.

use serde::Deserialize;

use super::{null_as_default, SiteExtractor};
use crate::client::Client;
use crate::error::GenError;
use crate::record::{EpicInfo, Record, SiteDetails, SystemRequirements};
use crate::resource::FetchOptions;
use crate::site::Site;

/// Public store link.
pub fn product_link(sid: &str) -> String {
    format!("https://www.epicgames.com/store/zh-CN/product/{}/home", sid)
}

/// Epic Games Store products.
pub struct Epic;

impl SiteExtractor for Epic {
    const SITE: Site = Site::Epic;

    async fn extract(&self, client: &Client, sid: &str) -> Result<Record, GenError> {
        let fetch_url = format!(
            "{}/api/zh-CN/content/products/{}",
            client.endpoints().epic_content,
            sid
        );
        let resp = client.get(&fetch_url, FetchOptions::lenient()).await?;
        if resp.is_not_found() {
            return Ok(Record::not_found(Self::SITE, sid));
        }
        if resp.status >= 400 {
            return Err(GenError::fetch(
                &fetch_url,
                "Epic",
                Some(anyhow::anyhow!("unexpected status {}", resp.status)),
            ));
        }

        let product: Product = resp.json()?;
        let info = parse_product(product, sid)
            .map_err(|e| GenError::extract(&fetch_url, "Epic", Some(e)))?;
        Ok(Record::found(Self::SITE, sid, SiteDetails::Epic(info)))
    }
}

// Upstream documents sometimes carry `null` where a list or object is expected.
#[derive(Debug, Deserialize)]
pub(crate) struct Product {
    #[serde(default, deserialize_with = "null_as_default")]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(rename = "productName", default, deserialize_with = "null_as_default")]
    product_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    data: PageData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageData {
    #[serde(deserialize_with = "null_as_default")]
    about: About,
    #[serde(deserialize_with = "null_as_default")]
    hero: Hero,
    #[serde(deserialize_with = "null_as_default")]
    gallery: Gallery,
    #[serde(deserialize_with = "null_as_default")]
    requirements: Requirements,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct About {
    #[serde(deserialize_with = "null_as_default")]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Hero {
    #[serde(rename = "logoImage")]
    logo_image: Option<Image>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Gallery {
    #[serde(rename = "galleryImages", deserialize_with = "null_as_default")]
    gallery_images: Vec<Image>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Image {
    #[serde(deserialize_with = "null_as_default")]
    src: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Requirements {
    #[serde(deserialize_with = "null_as_default")]
    languages: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    systems: Vec<SystemEntry>,
    #[serde(rename = "legalTags", deserialize_with = "null_as_default")]
    legal_tags: Vec<Image>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SystemEntry {
    #[serde(rename = "systemType", deserialize_with = "null_as_default")]
    system_type: String,
    #[serde(deserialize_with = "null_as_default")]
    details: Vec<RequirementDetail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RequirementDetail {
    #[serde(deserialize_with = "null_as_default")]
    title: String,
    minimum: Option<String>,
    recommended: Option<String>,
}

/// Fold the language list into display lines.
///
/// Entries without a `:`/`：` label continue the previous line; entries
/// containing `-` hold several labelled groups and are split.
pub(crate) fn merge_languages(raw: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for lang in raw {
        let labelled = lang.contains(':') || lang.contains('：');
        if !labelled && !merged.is_empty() {
            let last = merged.len() - 1;
            merged[last].push('、');
            merged[last].push_str(lang);
        } else if lang.contains('-') {
            merged.extend(lang.split('-').map(|part| part.trim().to_string()));
        } else {
            merged.push(lang.clone());
        }
    }
    merged
}

fn requirement_lines(
    systems: &[SystemEntry],
    pick: impl Fn(&RequirementDetail) -> Option<&str>,
) -> Vec<SystemRequirements> {
    systems
        .iter()
        .map(|system| SystemRequirements {
            system: system.system_type.clone(),
            lines: system
                .details
                .iter()
                .map(|d| format!("{}: {}", d.title, pick(d).unwrap_or_default()))
                .collect(),
        })
        .collect()
}

pub(crate) fn parse_product(product: Product, sid: &str) -> Result<EpicInfo, anyhow::Error> {
    let page = product
        .pages
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("product document has no pages"))?;
    let data = page.data;
    let requirements = &data.requirements;

    Ok(EpicInfo {
        name: page.product_name.trim().to_string(),
        epic_link: product_link(sid),
        desc: data.about.description.trim().to_string(),
        poster: data
            .hero
            .logo_image
            .as_ref()
            .map(|img| img.src.clone())
            .filter(|src| !src.is_empty()),
        screenshot: data
            .gallery
            .gallery_images
            .iter()
            .map(|img| img.src.clone())
            .filter(|src| !src.is_empty())
            .collect(),
        language: merge_languages(&requirements.languages),
        min_req: requirement_lines(&requirements.systems, |d| d.minimum.as_deref()),
        max_req: requirement_lines(&requirements.systems, |d| d.recommended.as_deref()),
        level: requirements
            .legal_tags
            .iter()
            .map(|img| img.src.clone())
            .filter(|src| !src.is_empty())
            .collect(),
    })
}
