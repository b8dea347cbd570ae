// ABOUTME: Bangumi subject extractor combining the subject page with its characters page.
// ABOUTME: Cast lines are derived as "character: performer，performer".

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use super::SiteExtractor;
use crate::client::Client;
use crate::error::GenError;
use crate::extractors::fields::{
    extract_attr_first, select_all, select_first, select_text, select_texts, text_of,
};
use crate::extractors::normalize::rating;
use crate::record::{BangumiInfo, Record, SiteDetails};
use crate::resource::FetchOptions;
use crate::site::Site;

const NOT_FOUND_MARKER: &str = "呜咕，出错了";

static COVER_SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/cover/[lcmsg]/").unwrap());

/// Public subject link.
pub fn subject_link(sid: &str) -> String {
    format!("https://bgm.tv/subject/{}", sid)
}

/// Bangumi (bgm.tv) subjects.
pub struct Bangumi;

impl SiteExtractor for Bangumi {
    const SITE: Site = Site::Bangumi;

    async fn extract(&self, client: &Client, sid: &str) -> Result<Record, GenError> {
        let fetch_url = format!("{}/subject/{}", client.endpoints().bangumi, sid);
        let page = client.get(&fetch_url, FetchOptions::lenient()).await?;
        let raw = page.text();
        if page.is_not_found() || raw.contains(NOT_FOUND_MARKER) {
            return Ok(Record::not_found(Self::SITE, sid));
        }

        let characters_url = format!("{}/characters", fetch_url);
        let characters_req = client.spawn_get(characters_url.clone(), FetchOptions::lenient());

        let mut info = parse_subject(&raw, &subject_link(sid));

        let characters = Client::join(characters_req, &characters_url).await?;
        if characters.status < 400 {
            info.cast = parse_characters(&characters.text());
        }

        Ok(Record::found(Self::SITE, sid, SiteDetails::Bangumi(info)))
    }
}

/// Parse the subject page; `cast` is left empty.
pub(crate) fn parse_subject(raw: &str, alt: &str) -> BangumiInfo {
    let doc = Html::parse_document(raw);
    let root = doc.root_element();

    let poster = extract_attr_first(root, "div#bangumiInfo a.thickbox.cover", "href").map(|href| {
        let absolute = if href.starts_with("//") {
            format!("https:{}", href)
        } else {
            href
        };
        COVER_SIZE_RE
            .replace(&absolute, "/cover/l/")
            .into_owned()
    });

    let bangumi_votes = select_text(root, r#"span[property="v:votes"]"#).parse().ok();
    let bangumi_rating_average =
        select_text(root, r#"div.global_score > span[property="v:average"]"#)
            .parse()
            .ok();

    BangumiInfo {
        alt: alt.to_string(),
        poster,
        story: select_text(root, "div#subject_summary"),
        staff: select_texts(root, "div#bangumiInfo ul#infobox li"),
        bangumi_votes,
        bangumi_rating_average,
        bangumi_rating: rating(bangumi_rating_average, bangumi_votes),
        tags: select_texts(
            root,
            "#subject_detail > div.subject_tag_section > div > a > span",
        ),
        cast: Vec::new(),
    }
}

/// One cast line per character on the characters page.
pub(crate) fn parse_characters(raw: &str) -> Vec<String> {
    let doc = Html::parse_document(raw);
    select_all(
        doc.root_element(),
        "div#columnInSubjectA > div.light_odd > div.clearit",
    )
    .into_iter()
    .map(|entry| {
        let character = select_first(entry, "h2 span.tip")
            .map(text_of)
            .filter(|t| !t.is_empty())
            .or_else(|| select_first(entry, "h2 a").map(text_of))
            .unwrap_or_default()
            .replacen('/', "", 1)
            .trim()
            .to_string();

        let performers: Vec<String> = select_all(entry, "div.clearit > p")
            .into_iter()
            .map(|p| {
                select_first(p, "small")
                    .map(text_of)
                    .filter(|t| !t.is_empty())
                    .or_else(|| select_first(p, "a").map(text_of))
                    .unwrap_or_default()
            })
            .collect();

        format!("{}: {}", character, performers.join("，"))
    })
    .collect()
}
