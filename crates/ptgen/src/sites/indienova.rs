// ABOUTME: indienova game database extractor working from a single game page.
// ABOUTME: Collects titles, store links, company lists, tags, rating images and store prices.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::SiteExtractor;
use crate::client::Client;
use crate::error::GenError;
use crate::extractors::fields::{
    extract_attr_first, next_element_sibling, raw_text, select_all, select_attrs,
    select_containing, select_text, text_of,
};
use crate::extractors::normalize::dedup_stable;
use crate::record::{IndienovaInfo, NamedLink, Record, SiteDetails};
use crate::resource::FetchOptions;
use crate::site::Site;

const NOT_FOUND_MARKER: &str = "出现错误";
const SHOW_ALL_TAGS: &str = "查看全部 +";
const SHOW_MORE: &str = "……显示全部";

static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \n]+").unwrap());
static PRICE_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \n]{2,}").unwrap());

/// indienova games.
pub struct Indienova;

impl SiteExtractor for Indienova {
    const SITE: Site = Site::Indienova;

    async fn extract(&self, client: &Client, sid: &str) -> Result<Record, GenError> {
        let fetch_url = format!("{}/game/{}", client.endpoints().indienova, sid);
        let page = client.get(&fetch_url, FetchOptions::lenient()).await?;
        let raw = page.text();
        if page.is_not_found() || raw.contains(NOT_FOUND_MARKER) {
            return Ok(Record::not_found(Self::SITE, sid));
        }

        let info = parse_game(&raw);
        Ok(Record::found(Self::SITE, sid, SiteDetails::Indienova(info)))
    }
}

fn trimmed_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_game(raw: &str) -> IndienovaInfo {
    let doc = Html::parse_document(raw);
    let root = doc.root_element();

    let chinese_title = select_text(root, "title")
        .split('|')
        .next()
        .and_then(|t| t.split('-').next())
        .unwrap_or_default()
        .trim()
        .to_string();

    let links = select_all(root, "div#tabs-link a.gamedb-link")
        .into_iter()
        .filter_map(|a| {
            let url = a.value().attr("href")?.trim().to_string();
            Some(NamedLink {
                name: text_of(a),
                url,
            })
        })
        .collect();

    let intro = select_text(root, "#tabs-intro div.bottommargin-sm");
    let intro_detail = select_all(root, "#tabs-intro p.single-line")
        .into_iter()
        .map(|p| {
            SPACE_RUN_RE
                .replace_all(&raw_text(p), " ")
                .replace(',', "/")
                .trim()
                .to_string()
        })
        .collect();

    let descr = if select_all(root, "article").is_empty() {
        intro.clone()
    } else {
        select_text(root, "article")
            .replacen(SHOW_MORE, "", 1)
            .trim()
            .to_string()
    };

    let scores: Vec<String> = select_all(root, "div#scores text")
        .into_iter()
        .map(raw_text)
        .collect();
    let rate = (scores.len() >= 4)
        .then(|| format!("{}:{} / {}:{}", scores[0], scores[1], scores[2], scores[3]));

    let companies = select_all(root, r#"div#tabs-devpub ul[class^="db-companies"]"#);
    let dev = companies
        .first()
        .map(|ul| trimmed_lines(&raw_text(*ul)))
        .unwrap_or_default();
    let publishers = if companies.len() == 2 {
        trimmed_lines(&raw_text(companies[1]))
    } else {
        Vec::new()
    };

    let cat = dedup_stable(
        trimmed_lines(&select_text(root, "div.indienova-tags.gamedb-tags"))
            .into_iter()
            .filter(|t| t != SHOW_ALL_TAGS)
            .collect(),
    );

    IndienovaInfo {
        poster: extract_attr_first(root, "div.cover-image img", "src"),
        chinese_title,
        another_title: select_text(root, "div.title-holder h1 small"),
        english_title: select_text(root, "div.title-holder h1 span"),
        release_date: select_text(root, "div.title-holder p.gamedb-release"),
        links,
        intro,
        intro_detail,
        descr,
        rate,
        dev,
        publishers,
        screenshot: select_attrs(root, "li.slide img", "src"),
        cat,
        level: parse_level(root),
        price: parse_prices(root),
    }
}

/// Rating board images in the block right after the "分级" heading.
fn parse_level(root: ElementRef<'_>) -> Vec<String> {
    select_containing(root, "h4", "分级")
        .into_iter()
        .filter_map(next_element_sibling)
        .filter(|el| {
            el.value().name() == "div" && el.value().classes().any(|c| c == "bottommargin-sm")
        })
        .flat_map(|block| select_attrs(block, "img", "src"))
        .collect()
}

/// "store：price" per store entry; each entry holds store, platform and price blocks.
fn parse_prices(root: ElementRef<'_>) -> Vec<String> {
    select_all(root, "ul.db-stores li")
        .into_iter()
        .map(|li| {
            let blocks = select_all(li, "a > div");
            let store = blocks.first().map(|b| text_of(*b)).unwrap_or_default();
            let price = blocks
                .get(2)
                .map(|b| PRICE_SPACE_RE.replace(&text_of(*b), " ").into_owned())
                .unwrap_or_default();
            format!("{}：{}", store, price)
        })
        .collect()
}
