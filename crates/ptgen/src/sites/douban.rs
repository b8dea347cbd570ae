// ABOUTME: Douban movie extractor: subject page, JSON-LD block, awards page and IMDb rating enrichment.
// ABOUTME: Detects removed subjects and the anti-automation interstitial by page markers.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::warn;

use super::{credits, json_str, SiteExtractor};
use crate::client::Client;
use crate::error::GenError;
use crate::extractors::fields::{
    extract_attr_first, next_text_sibling, select_containing, select_first, select_text,
    select_texts, text_of,
};
use crate::extractors::normalize::{
    clean_lines, json_f64, json_u64, rating, sort_aliases, sort_dates,
};
use crate::record::{DoubanInfo, Record, SiteDetails, DOUBAN_BLOCKED_ERROR};
use crate::resource::{parse_jsonp, FetchOptions};
use crate::site::Site;

const NOT_FOUND_MARKER: &str = "你想访问的页面不存在";
const BLOCKED_MARKER: &str = "检测到有异常请求";
const NO_INTRODUCTION: &str = "暂无相关剧情介绍";

static PAGE_MARKERS: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new([NOT_FOUND_MARKER, BLOCKED_MARKER]).unwrap());

static POSTER_SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"s(_ratio_poster|pic)").unwrap());
static IMDB_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d+").unwrap());

static SOURCE_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*").unwrap());
static BLOCK_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(div|ul)[^>]*>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static TRAILING_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +\n").unwrap());
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Public subject link, independent of the configured fetch endpoint.
pub fn subject_link(sid: &str) -> String {
    format!("https://movie.douban.com/subject/{}/", sid)
}

/// What the subject page says about itself before any parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageState {
    Ok,
    NotFound,
    Blocked,
}

pub(crate) fn page_state(raw: &str) -> PageState {
    match PAGE_MARKERS.find(raw).map(|m| m.pattern().as_usize()) {
        Some(0) => PageState::NotFound,
        Some(_) => PageState::Blocked,
        None => PageState::Ok,
    }
}

/// Douban movie/TV subjects.
pub struct Douban;

impl SiteExtractor for Douban {
    const SITE: Site = Site::Douban;

    async fn extract(&self, client: &Client, sid: &str) -> Result<Record, GenError> {
        let fetch_url = format!("{}/subject/{}/", client.endpoints().douban, sid);
        let page = client.get(&fetch_url, FetchOptions::lenient()).await?;
        let raw = page.text();

        match page_state(&raw) {
            PageState::NotFound => return Ok(Record::not_found(Self::SITE, sid)),
            PageState::Blocked => {
                return Ok(Record::blocked(Self::SITE, sid, DOUBAN_BLOCKED_ERROR))
            }
            PageState::Ok if page.is_not_found() => {
                return Ok(Record::not_found(Self::SITE, sid))
            }
            PageState::Ok => {}
        }

        let awards_url = format!("{}awards", fetch_url);
        let awards_req = client.spawn_get(awards_url.clone(), FetchOptions::lenient());

        let mut info = parse_subject(&raw, &subject_link(sid));

        if let Some(imdb_id) = info.imdb_id.clone() {
            let (average, votes) = imdb_rating(client, &imdb_id).await;
            info.imdb_rating_average = average;
            info.imdb_votes = votes;
            info.imdb_rating = rating(average, votes);
        }

        match Client::join(awards_req, &awards_url).await {
            Ok(page) if page.status < 400 => info.awards = parse_awards(&page.text()),
            Ok(page) => warn!(status = page.status, sid, "douban awards unavailable"),
            Err(e) => warn!(error = %e, sid, "douban awards fetch failed"),
        }

        Ok(Record::found(Self::SITE, sid, SiteDetails::Douban(info)))
    }
}

/// Fetch the IMDb rating for a cross-referenced title.
///
/// Any failure is logged and treated the same as a missing rating.
async fn imdb_rating(client: &Client, imdb_id: &str) -> (Option<f64>, Option<u64>) {
    let url = format!(
        "{}/static-content/documents/v1/title/{}/ratings%3Fjsonp=imdb.rating.run:imdb.api.title.ratings/data.json",
        client.endpoints().imdb_ratings,
        imdb_id
    );
    match client.get(&url, FetchOptions::default()).await {
        Ok(resp) => parse_imdb_ratings(&resp.text()),
        Err(e) => {
            warn!(imdb_id, error = %e, "imdb rating enrichment dropped");
            (None, None)
        }
    }
}

/// Read `resource.rating` and `resource.ratingCount` from the ratings JSONP.
pub(crate) fn parse_imdb_ratings(raw: &str) -> (Option<f64>, Option<u64>) {
    let Some(json) = parse_jsonp(raw) else {
        warn!("imdb rating payload is not JSONP");
        return (None, None);
    };
    let resource = &json["resource"];
    (json_f64(&resource["rating"]), json_u64(&resource["ratingCount"]))
}

fn info_label(root: ElementRef<'_>, label: &str) -> Option<String> {
    select_containing(root, "#info span.pl", label)
        .into_iter()
        .next()
        .and_then(next_text_sibling)
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|r| {
        r.split(" / ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn split_slash(joined: &str) -> Vec<String> {
    joined
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The IMDb cross-reference, from either an outbound link or the plain `IMDb:` row.
fn imdb_reference(root: ElementRef<'_>) -> Option<(String, String)> {
    let href = extract_attr_first(root, "div#info a[href*='://www.imdb.com/title/tt']", "href");
    let id = match &href {
        Some(h) => IMDB_ID_RE.find(h).map(|m| m.as_str().to_string()),
        None => info_label(root, "IMDb")
            .and_then(|t| IMDB_ID_RE.find(&t).map(|m| m.as_str().to_string())),
    }?;
    let link = match href {
        Some(h) => {
            let h = h.replacen("http://", "https://", 1);
            if h.ends_with('/') {
                h
            } else {
                format!("{}/", h)
            }
        }
        None => format!("https://www.imdb.com/title/{}/", id),
    };
    Some((id, link))
}

/// Parse the subject page into everything except awards and the IMDb rating.
pub(crate) fn parse_subject(raw: &str, douban_link: &str) -> DoubanInfo {
    let doc = Html::parse_document(raw);
    let root = doc.root_element();

    let chinese_title = select_text(root, "title").replace("(豆瓣)", "").trim().to_string();
    let ld = crate::extractors::fields::ld_json(root, r#"head > script[type="application/ld+json"]"#)
        .unwrap_or(serde_json::Value::Null);

    let foreign_title = Some(
        select_text(root, r#"span[property="v:itemreviewed"]"#)
            .replace(&chinese_title, "")
            .trim()
            .to_string(),
    )
    .filter(|t| !t.is_empty());

    let aka = info_label(root, "又名")
        .map(|raw| sort_aliases(&raw, " / "))
        .unwrap_or_default();
    let aka_joined = aka.join("/");

    let (trans_title, this_title) = match &foreign_title {
        Some(foreign) => {
            let trans = if aka.is_empty() {
                chinese_title.clone()
            } else {
                format!("{}/{}", chinese_title, aka_joined)
            };
            (split_slash(&trans), split_slash(foreign))
        }
        None => (split_slash(&aka_joined), split_slash(&chinese_title)),
    };

    let year: String = select_text(root, "#content > h1 > span.year")
        .chars()
        .skip(1)
        .take(4)
        .collect();

    let duration = info_label(root, "单集片长").or_else(|| {
        Some(select_text(root, r#"#info span[property="v:runtime"]"#)).filter(|d| !d.is_empty())
    });

    let introduction = select_first(root, "#link-report > span.all.hidden")
        .or_else(|| select_first(root, r#"#link-report > [property="v:summary"]"#))
        .map(|el| clean_lines(&text_of(el)))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_INTRODUCTION.to_string());

    let aggregate = &ld["aggregateRating"];
    let douban_rating_average = json_f64(&aggregate["ratingValue"]);
    let douban_votes = json_u64(&aggregate["ratingCount"]);

    let poster = json_str(&ld, "image").map(|image| {
        POSTER_SIZE_RE
            .replace_all(&image, "l${1}")
            .replacen("img3", "img1", 1)
    });

    let (imdb_id, imdb_link) = match imdb_reference(root) {
        Some((id, link)) => (Some(id), Some(link)),
        None => (None, None),
    };

    DoubanInfo {
        douban_link: douban_link.to_string(),
        chinese_title,
        foreign_title,
        aka,
        trans_title,
        this_title,
        year: Some(year).filter(|y| !y.is_empty()),
        region: split_list(info_label(root, "制片国家/地区")),
        genre: select_texts(root, r#"#info span[property="v:genre"]"#),
        language: split_list(info_label(root, "语言")),
        playdate: sort_dates(select_texts(
            root,
            r#"#info span[property="v:initialReleaseDate"]"#,
        )),
        episodes: info_label(root, "集数"),
        duration,
        introduction,
        douban_rating_average,
        douban_votes,
        douban_rating: rating(douban_rating_average, douban_votes),
        imdb_link,
        imdb_id,
        poster,
        director: credits(&ld["director"], false),
        writer: credits(&ld["author"], false),
        cast: credits(&ld["actor"], false),
        tags: select_texts(root, r#"div.tags-body > a[href^="/tag"]"#),
        ..Default::default()
    }
}

/// Flatten the awards listing into one line per award, blank line between ceremonies.
pub(crate) fn parse_awards(raw: &str) -> Option<String> {
    let doc = Html::parse_document(raw);
    let article = select_first(doc.root_element(), "#content > div > div.article")?;
    let html = article.inner_html();

    let text = SOURCE_WS_RE.replace_all(&html, "");
    let text = text
        .replace("</li><li>", "</li> <li>")
        .replace("</a><span", "</a> <span");
    let text = BLOCK_OPEN_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = text.replace("&nbsp;", " ").replace("&amp;", "&");
    let text = TRAILING_SPACE_RE.replace_all(&text, "\n");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    let text = text.trim();

    (!text.is_empty()).then(|| text.to_string())
}
