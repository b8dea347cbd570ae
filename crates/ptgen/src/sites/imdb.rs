// ABOUTME: IMDb title extractor: title page JSON-LD, review bar, details block and release info page.
// ABOUTME: Normalizes bare numeric ids to the zero-padded `tt` form before any URL is built.

use std::collections::BTreeMap;

use scraper::Html;

use super::{credits, json_str, SiteExtractor};
use crate::client::Client;
use crate::error::GenError;
use crate::extractors::fields::{ld_json, raw_text, select_all, select_first, select_text, text_of};
use crate::extractors::normalize::{
    collapse_whitespace, json_f64, json_u64, number_from_str, rating, sort_by_date,
};
use crate::record::{AkaTitle, ImdbInfo, Record, ReleaseDate, SiteDetails};
use crate::resource::FetchOptions;
use crate::site::Site;

const NOT_FOUND_MARKER: &str = "404 Error - IMDb";
const ID_WIDTH: usize = 7;

/// Normalize `tt123`, `123` or `tt0000123` to `tt0000123`. Ids longer than
/// seven digits are kept as they are.
pub fn normalize_id(sid: &str) -> String {
    let digits = sid.trim().strip_prefix("tt").unwrap_or(sid.trim());
    format!("tt{:0>width$}", digits, width = ID_WIDTH)
}

/// Public title link.
pub fn title_link(imdb_id: &str) -> String {
    format!("https://www.imdb.com/title/{}/", imdb_id)
}

/// IMDb titles (films, series, episodes).
pub struct Imdb;

impl SiteExtractor for Imdb {
    const SITE: Site = Site::Imdb;

    async fn extract(&self, client: &Client, sid: &str) -> Result<Record, GenError> {
        let imdb_id = normalize_id(sid);
        let fetch_url = format!("{}/title/{}/", client.endpoints().imdb, imdb_id);

        let page = client.get(&fetch_url, FetchOptions::lenient()).await?;
        let raw = page.text();
        if page.is_not_found() || raw.contains(NOT_FOUND_MARKER) {
            return Ok(Record::not_found(Self::SITE, sid));
        }

        let release_url = format!("{}releaseinfo", fetch_url);
        let release_req = client.spawn_get(release_url.clone(), FetchOptions::lenient());

        let mut info = parse_title(&raw, &imdb_id).map_err(|e| {
            GenError::extract(&fetch_url, "Imdb", Some(e))
        })?;

        let release_page = Client::join(release_req, &release_url).await?;
        if release_page.status < 400 {
            let (release_date, aka) = parse_release_info(&release_page.text());
            info.release_date = release_date;
            info.aka = aka;
        }

        Ok(Record::found(Self::SITE, sid, SiteDetails::Imdb(info)))
    }
}

fn genres(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|g| g.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse the title page. A page without its JSON-LD block is not a title page.
pub(crate) fn parse_title(raw: &str, imdb_id: &str) -> Result<ImdbInfo, anyhow::Error> {
    let doc = Html::parse_document(raw);
    let root = doc.root_element();

    let ld = ld_json(root, r#"script[type="application/ld+json"]"#)
        .ok_or_else(|| anyhow::anyhow!("title page has no JSON-LD block"))?;

    let date_published = json_str(&ld, "datePublished");
    let aggregate = &ld["aggregateRating"];
    let imdb_rating_average = json_f64(&aggregate["ratingValue"]);
    let imdb_votes = json_u64(&aggregate["ratingCount"]);

    let mut info = ImdbInfo {
        imdb_id: imdb_id.to_string(),
        imdb_link: title_link(imdb_id),
        kind: json_str(&ld, "@type"),
        name: json_str(&ld, "name"),
        genre: genres(&ld["genre"]),
        content_rating: json_str(&ld, "contentRating"),
        year: date_published
            .as_deref()
            .map(|d| d.chars().take(4).collect()),
        date_published,
        description: json_str(&ld, "description"),
        duration: json_str(&ld, "duration"),
        poster: json_str(&ld, "image"),
        actors: credits(&ld["actor"], true),
        directors: credits(&ld["director"], true),
        creators: credits(&ld["creator"], true),
        keywords: json_str(&ld, "keywords")
            .map(|k| {
                k.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        imdb_rating_average,
        imdb_votes,
        imdb_rating: rating(imdb_rating_average, imdb_votes),
        ..Default::default()
    };

    for item in select_all(root, "div.titleReviewBar > div.titleReviewBarItem") {
        let text = raw_text(item);
        if text.contains("Metascore") {
            info.metascore = select_first(item, "div.metacriticScore")
                .map(text_of)
                .filter(|s| !s.is_empty());
        } else if text.contains("Reviews") {
            info.reviews = number_from_str(&select_text(item, "a[href^=reviews]"));
            info.critic = number_from_str(&select_text(item, "a[href^=externalreviews]"));
        } else if text.contains("Popularity") {
            info.popularity = number_from_str(&text);
        }
    }

    info.details = parse_details(&doc);
    Ok(info)
}

fn parse_details(doc: &Html) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();
    for block in select_all(doc.root_element(), "div#titleDetails div.txt-block") {
        let text = raw_text(block)
            .replace('\n', " ")
            .replace("See more »", "")
            .replace("Show more on   IMDbPro »", "");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let (key, value) = match text.split_once(':') {
            Some((k, v)) => (k.trim().to_string(), collapse_whitespace(v)),
            None => (text.to_string(), collapse_whitespace(text)),
        };
        details.insert(key, value);
    }
    details
}

/// Release dates (sorted by date) and alternate titles from the release info page.
pub(crate) fn parse_release_info(raw: &str) -> (Vec<ReleaseDate>, Vec<AkaTitle>) {
    let doc = Html::parse_document(raw);
    let root = doc.root_element();

    let mut release_dates: Vec<ReleaseDate> = select_all(root, "tr.release-date-item")
        .into_iter()
        .filter_map(|row| {
            let country = select_first(row, "td.release-date-item__country-name")?;
            let date = select_first(row, "td.release-date-item__date")?;
            Some(ReleaseDate {
                country: text_of(country),
                date: text_of(date),
            })
        })
        .collect();
    sort_by_date(&mut release_dates, |r| r.date.as_str());

    let aka = select_all(root, "tr.aka-item")
        .into_iter()
        .filter_map(|row| {
            let country = select_first(row, "td.aka-item__name")?;
            let title = select_first(row, "td.aka-item__title")?;
            Some(AkaTitle {
                country: text_of(country),
                title: text_of(title),
            })
        })
        .collect();

    (release_dates, aka)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_ids() {
        assert_eq!(normalize_id("1234567"), "tt1234567");
        assert_eq!(normalize_id("tt0111161"), "tt0111161");
        assert_eq!(normalize_id("111161"), "tt0111161");
        assert_eq!(normalize_id("tt12345678"), "tt12345678");
    }

    const TITLE: &str = r#"<html><head>
<script type="application/ld+json">{"@context":"http://schema.org","@type":"Movie","name":"The Shawshank Redemption",
"image":"https://m.media-amazon.com/images/M/poster.jpg","genre":"Drama","contentRating":"R",
"actor":[{"@type":"Person","url":"/name/nm0000209/","name":"Tim Robbins"},{"@type":"Person","url":"/name/nm0000151/","name":"Morgan Freeman"}],
"director":{"@type":"Person","url":"/name/nm0001104/","name":"Frank Darabont"},
"creator":[{"@type":"Organization","url":"/company/co0040620/"},{"@type":"Person","url":"/name/nm0000175/","name":"Stephen King"}],
"description":"Two imprisoned men bond over a number of years.","datePublished":"1994-10-14",
"keywords":"wrongful imprisonment,prison,friendship","aggregateRating":{"@type":"AggregateRating","ratingCount":2500000,"ratingValue":9.3},
"duration":"PT2H22M"}</script></head><body>
<div class="titleReviewBar">
  <div class="titleReviewBarItem"><a href="criticreviews"><div class="metacriticScore score_favorable"><span>80</span></div></a> Metascore</div>
  <div class="titleReviewBarItem">Reviews <span><a href="reviews">10,150 user</a> | <a href="externalreviews">200 critic</a></span></div>
  <div class="titleReviewBarItem">Popularity <span class="subText">72 ( 3)</span></div>
</div>
<div id="titleDetails">
  <div class="txt-block"><h4 class="inline">Country:</h4> <a href="/c">USA</a></div>
  <div class="txt-block"><h4 class="inline">Language:</h4>   <a href="/l">English</a> See more »</div>
</div>
</body></html>"#;

    #[test]
    fn parses_title_page() {
        let info = parse_title(TITLE, "tt0111161").unwrap();
        assert_eq!(info.kind.as_deref(), Some("Movie"));
        assert_eq!(info.name.as_deref(), Some("The Shawshank Redemption"));
        assert_eq!(info.genre, vec!["Drama"]);
        assert_eq!(info.year.as_deref(), Some("1994"));
        assert_eq!(info.actors.len(), 2);
        assert_eq!(info.directors[0].name, "Frank Darabont");
        assert_eq!(info.creators.len(), 1);
        assert_eq!(info.creators[0].name, "Stephen King");
        assert_eq!(
            info.keywords,
            vec!["wrongful imprisonment", "prison", "friendship"]
        );
        assert_eq!(
            info.imdb_rating.as_deref(),
            Some("9.3/10 from 2500000 users")
        );
        assert_eq!(info.metascore.as_deref(), Some("80"));
        assert_eq!(info.reviews.as_deref(), Some("10150"));
        assert_eq!(info.critic.as_deref(), Some("200"));
        assert_eq!(info.popularity.as_deref(), Some("72"));
        assert_eq!(info.details.get("Country").map(String::as_str), Some("USA"));
        assert_eq!(
            info.details.get("Language").map(String::as_str),
            Some("English")
        );
        assert_eq!(info.imdb_link, "https://www.imdb.com/title/tt0111161/");
    }

    #[test]
    fn page_without_json_ld_is_an_error() {
        assert!(parse_title("<html></html>", "tt1").is_err());
    }

    #[test]
    fn parses_release_info_sorted() {
        let raw = r#"<table>
<tr class="release-date-item"><td class="release-date-item__country-name">Japan</td><td class="release-date-item__date">3 June 1995</td></tr>
<tr class="release-date-item"><td class="release-date-item__country-name">Canada</td><td class="release-date-item__date">10 September 1994</td></tr>
<tr class="release-date-item"><td class="release-date-item__country-name">USA</td><td class="release-date-item__date">14 October 1994</td></tr>
<tr class="aka-item"><td class="aka-item__name">France</td><td class="aka-item__title">Les évadés</td></tr>
</table>"#;
        let (dates, aka) = parse_release_info(raw);
        let countries: Vec<&str> = dates.iter().map(|d| d.country.as_str()).collect();
        assert_eq!(countries, vec!["Canada", "USA", "Japan"]);
        assert_eq!(aka.len(), 1);
        assert_eq!(aka[0].title, "Les évadés");
    }
}
