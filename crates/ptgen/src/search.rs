// ABOUTME: Search extractors querying the douban, IMDb and Bangumi suggestion endpoints.
// ABOUTME: Upstream item shapes are mapped into SearchItem; a failed call is an internal fault.

use std::fmt;

use serde::Deserialize;
use url::Url;

use crate::client::Client;
use crate::error::{GenError, RequestError};
use crate::record::SearchItem;
use crate::resource::FetchOptions;
use crate::site::Site;
use crate::sites::null_as_default;

/// A site with a search function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchSource {
    #[default]
    Douban,
    Imdb,
    Bangumi,
}

impl SearchSource {
    /// Parse the inbound `source` value.
    ///
    /// A known site without a search function is distinguished from an
    /// unknown tag.
    pub fn parse(source: &str) -> Result<Self, RequestError> {
        let site: Site = source
            .parse()
            .map_err(|_| RequestError::UnknownSource(source.to_string()))?;
        match site {
            Site::Douban => Ok(SearchSource::Douban),
            Site::Imdb => Ok(SearchSource::Imdb),
            Site::Bangumi => Ok(SearchSource::Bangumi),
            other => Err(RequestError::MissingSearch(other.to_string())),
        }
    }

    pub fn site(&self) -> Site {
        match self {
            SearchSource::Douban => Site::Douban,
            SearchSource::Imdb => Site::Imdb,
            SearchSource::Bangumi => Site::Bangumi,
        }
    }
}

impl fmt::Display for SearchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.site().fmt(f)
    }
}

/// Run `query` against the suggestion endpoint of `source`.
pub async fn search(
    client: &Client,
    source: SearchSource,
    query: &str,
) -> Result<Vec<SearchItem>, GenError> {
    let endpoints = client.endpoints();
    match source {
        SearchSource::Douban => {
            let mut url = parse_base(&endpoints.douban, &["j", "subject_suggest"])?;
            url.query_pairs_mut().append_pair("q", query);
            let items: Vec<DoubanSuggestion> = fetch_json(client, url).await?;
            Ok(items.into_iter().map(SearchItem::from).collect())
        }
        SearchSource::Imdb => {
            let query = query.to_lowercase();
            let initial: String = query.chars().take(1).collect();
            let file = format!("{}.json", query);
            let url = parse_base(&endpoints.imdb_suggest, &["suggestion", &initial, &file])?;
            let doc: ImdbSuggestions = fetch_json(client, url).await?;
            Ok(doc
                .d
                .into_iter()
                .filter(|d| d.id.starts_with("tt"))
                .map(SearchItem::from)
                .collect())
        }
        SearchSource::Bangumi => {
            let mut url = parse_base(&endpoints.bangumi_api, &["search", "subject", query])?;
            url.query_pairs_mut().append_pair("responseGroup", "large");
            let doc: BangumiResults = fetch_json(client, url).await?;
            Ok(doc.list.into_iter().map(SearchItem::from).collect())
        }
    }
}

/// Join percent-encoded path segments onto an endpoint base.
fn parse_base(base: &str, segments: &[&str]) -> Result<Url, GenError> {
    let mut url = Url::parse(base).map_err(|e| GenError::fetch(base, "Search", Some(e.into())))?;
    url.path_segments_mut()
        .map_err(|_| {
            GenError::fetch(
                base,
                "Search",
                Some(anyhow::anyhow!("endpoint cannot be a base URL")),
            )
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: Url,
) -> Result<T, GenError> {
    let resp = client.get(url.as_str(), FetchOptions::default()).await?;
    resp.json()
}

fn present(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DoubanSuggestion {
    #[serde(deserialize_with = "null_as_default")]
    id: String,
    #[serde(deserialize_with = "null_as_default")]
    title: String,
    #[serde(deserialize_with = "null_as_default")]
    sub_title: String,
    #[serde(deserialize_with = "null_as_default")]
    year: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    kind: String,
}

impl From<DoubanSuggestion> for SearchItem {
    fn from(d: DoubanSuggestion) -> Self {
        SearchItem {
            link: format!("https://movie.douban.com/subject/{}/", d.id),
            title: d.title,
            subtitle: present(d.sub_title),
            year: present(d.year),
            subtype: present(d.kind),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImdbSuggestions {
    #[serde(deserialize_with = "null_as_default")]
    d: Vec<ImdbSuggestion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImdbSuggestion {
    #[serde(deserialize_with = "null_as_default")]
    id: String,
    #[serde(deserialize_with = "null_as_default")]
    l: String,
    #[serde(deserialize_with = "null_as_default")]
    q: String,
    y: Option<i64>,
}

impl From<ImdbSuggestion> for SearchItem {
    fn from(d: ImdbSuggestion) -> Self {
        SearchItem {
            link: format!("https://www.imdb.com/title/{}", d.id),
            title: d.l,
            subtitle: None,
            year: d.y.map(|y| y.to_string()),
            subtype: present(d.q),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BangumiResults {
    #[serde(deserialize_with = "null_as_default")]
    list: Vec<BangumiSubject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BangumiSubject {
    #[serde(deserialize_with = "null_as_default")]
    url: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    kind: u8,
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    name_cn: String,
    #[serde(deserialize_with = "null_as_default")]
    air_date: String,
}

/// Display label of a Bangumi subject type code.
pub fn bangumi_type_label(code: u8) -> Option<&'static str> {
    match code {
        1 => Some("漫画/小说"),
        2 => Some("动画/二次元番"),
        3 => Some("音乐"),
        4 => Some("游戏"),
        6 => Some("三次元番"),
        _ => None,
    }
}

impl From<BangumiSubject> for SearchItem {
    fn from(d: BangumiSubject) -> Self {
        let title = if d.name_cn.is_empty() {
            d.name.clone()
        } else {
            d.name_cn
        };
        SearchItem {
            title,
            subtitle: present(d.name),
            year: present(d.air_date.chars().take(4).collect()),
            subtype: bangumi_type_label(d.kind).map(str::to_string),
            link: d.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_sources() {
        assert_eq!(SearchSource::parse("imdb").unwrap(), SearchSource::Imdb);
        assert_eq!(
            SearchSource::parse("steam").unwrap_err(),
            RequestError::MissingSearch("steam".into())
        );
        assert_eq!(
            SearchSource::parse("netflix").unwrap_err(),
            RequestError::UnknownSource("netflix".into())
        );
    }

    #[test]
    fn maps_bangumi_subjects() {
        let subject: BangumiSubject = serde_json::from_value(json!({
            "id": 1, "url": "http://bgm.tv/subject/1", "type": 4,
            "name": "Portal", "name_cn": "", "air_date": "2007-10-10"
        }))
        .unwrap();
        let item = SearchItem::from(subject);
        assert_eq!(item.title, "Portal");
        assert_eq!(item.subtitle.as_deref(), Some("Portal"));
        assert_eq!(item.year.as_deref(), Some("2007"));
        assert_eq!(item.subtype.as_deref(), Some("游戏"));
        assert_eq!(bangumi_type_label(5), None);
    }

    #[test]
    fn maps_douban_suggestions_with_absent_fields() {
        let d: DoubanSuggestion =
            serde_json::from_value(json!({"id": "1292052", "title": "肖申克的救赎", "type": "movie"}))
                .unwrap();
        let item = SearchItem::from(d);
        assert_eq!(item.link, "https://movie.douban.com/subject/1292052/");
        assert_eq!(item.subtitle, None);
        assert_eq!(item.year, None);
        assert_eq!(item.subtype.as_deref(), Some("movie"));
    }

    #[test]
    fn base_url_segments_are_encoded() {
        let url = parse_base("https://api.bgm.tv", &["search", "subject", "a b"]).unwrap();
        assert_eq!(url.as_str(), "https://api.bgm.tv/search/subject/a%20b");
    }

    #[test]
    fn null_upstream_fields_map_to_absent() {
        let doc: BangumiResults = serde_json::from_value(json!({
            "list": [{"url": "http://bgm.tv/subject/2", "type": 2,
                      "name": "カウボーイビバップ", "name_cn": null, "air_date": null}]
        }))
        .unwrap();
        let item = SearchItem::from(doc.list.into_iter().next().unwrap());
        assert_eq!(item.title, "カウボーイビバップ");
        assert_eq!(item.year, None);

        let empty: BangumiResults = serde_json::from_value(json!({"list": null})).unwrap();
        assert!(empty.list.is_empty());
    }
}
