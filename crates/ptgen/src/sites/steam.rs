// ABOUTME: Steam store extractor; the store page is fetched without following redirects.
// ABOUTME: A redirect to the storefront means the app does not exist.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use tracing::warn;

use super::SiteExtractor;
use crate::client::Client;
use crate::error::GenError;
use crate::extractors::bbcode::element_to_bbcode;
use crate::extractors::fields::{
    extract_attr_first, raw_text, select_all, select_containing, select_first, select_texts,
    text_of,
};
use crate::extractors::normalize::clean_lines;
use crate::record::{Record, SiteDetails, SteamInfo};
use crate::resource::{parse_jsonp, FetchOptions};
use crate::site::Site;

/// Skips the age gate and mature-content interstitials and forces Simplified Chinese.
const STORE_COOKIE: &str = "lastagecheckage=1-January-1975; birthtime=157737601; mature_content=1; wants_mature_content=1; Steam_Language=schinese";

const LANGUAGE_COLUMNS: [&str; 3] = ["界面", "完全音频", "字幕"];
const LANGUAGE_ROWS: usize = 3;
const ABOUT_HEADING: &str = "[h2]关于这款游戏[/h2]";

static CACHE_BUSTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?t=\d+$").unwrap());
static DETAIL_COLON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":[ \t\n]+").unwrap());
static REVIEW_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\n]{2,}").unwrap());
static LINKFILTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.+?url=(.+)$").unwrap());
static SCREENSHOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+?url=(http.+?)\.[\dx]+(.+?)(\?t=\d+)?$").unwrap());

/// Steam store apps.
pub struct Steam;

impl SiteExtractor for Steam {
    const SITE: Site = Site::Steam;

    async fn extract(&self, client: &Client, sid: &str) -> Result<Record, GenError> {
        let endpoints = client.endpoints();
        let fetch_url = format!("{}/app/{}/?l=schinese", endpoints.steam, sid);
        let page = client
            .get_no_redirect(
                &fetch_url,
                FetchOptions::lenient().header("Cookie", STORE_COOKIE),
            )
            .await?;
        if page.is_redirect() || page.is_not_found() {
            return Ok(Record::not_found(Self::SITE, sid));
        }

        let localization_url = format!(
            "{}/app/{}/data.js?v=38",
            endpoints.steam_localization, sid
        );
        let localization_req =
            client.spawn_get(localization_url.clone(), FetchOptions::lenient());

        let mut info = parse_store_page(&page.text(), sid);

        match Client::join(localization_req, &localization_url).await {
            Ok(resp) if resp.status < 400 => info.name_chs = parse_localized_name(&resp.text()),
            Ok(resp) => warn!(status = resp.status, sid, "steam localization unavailable"),
            Err(e) => warn!(error = %e, sid, "steam localization fetch failed"),
        }

        Ok(Record::found(Self::SITE, sid, SiteDetails::Steam(info)))
    }
}

/// The Chinese name from the localization JSONP payload.
pub(crate) fn parse_localized_name(raw: &str) -> Option<String> {
    parse_jsonp(raw)?
        .get("name_cn")?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn parse_store_page(raw: &str, sid: &str) -> SteamInfo {
    let doc = Html::parse_document(raw);
    let root = doc.root_element();

    let name = ["div.apphub_AppName", r#"span[itemprop="name"]"#]
        .iter()
        .filter_map(|sel| select_first(root, sel).map(text_of))
        .find(|t| !t.is_empty())
        .unwrap_or_default();

    let poster = extract_attr_first(root, "img.game_header_image_full", "src")
        .map(|src| CACHE_BUSTER_RE.replace(&src, "").into_owned());

    let detail = select_first(root, "div.details_block")
        .map(|block| clean_lines(&DETAIL_COLON_RE.replace_all(&raw_text(block), ": ")))
        .unwrap_or_default();

    let review = select_all(root, "div.user_reviews_summary_row")
        .into_iter()
        .map(|row| {
            let text = raw_text(row).replacen('：', ":", 1);
            REVIEW_SPACE_RE.replace_all(&text, " ").trim().to_string()
        })
        .filter(|t| !t.is_empty())
        .collect();

    let linkbar = select_containing(root, "a.linkbar", "访问网站")
        .into_iter()
        .find_map(|a| a.value().attr("href"))
        .map(|href| LINKFILTER_RE.replace(href, "$1").into_owned());

    let descr = select_first(root, "div#game_area_description")
        .map(|el| element_to_bbcode(el).replace(ABOUT_HEADING, "").trim().to_string())
        .unwrap_or_default();

    let screenshot = select_all(root, "div.screenshot_holder a")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .map(|href| SCREENSHOT_RE.replace(href, "$1$2").into_owned())
        .collect();

    SteamInfo {
        steam_id: sid.to_string(),
        poster,
        name,
        name_chs: None,
        detail,
        tags: select_texts(root, "a.app_tag"),
        review,
        linkbar,
        language: parse_languages(root),
        descr,
        screenshot,
        sysreq: parse_requirements(root),
    }
}

/// First supported languages after the header row, with their support columns.
fn parse_languages(root: ElementRef<'_>) -> Vec<String> {
    select_all(root, "table.game_language_options tr")
        .into_iter()
        .filter(|row| row.value().attr("class") != Some("unsupported"))
        .skip(1)
        .take(LANGUAGE_ROWS)
        .map(|row| {
            let cells = select_all(row, "td");
            let language = cells.first().map(|c| text_of(*c)).unwrap_or_default();
            let supported: Vec<&str> = LANGUAGE_COLUMNS
                .iter()
                .enumerate()
                .filter(|(i, _)| {
                    cells
                        .get(i + 1)
                        .is_some_and(|cell| raw_text(*cell).contains('✔'))
                })
                .map(|(_, column)| *column)
                .collect();
            if supported.is_empty() {
                language
            } else {
                format!("{} ({})", language, supported.join(", "))
            }
        })
        .collect()
}

fn os_label(data_os: &str) -> &str {
    match data_os {
        "win" => "Windows",
        "mac" => "Mac OS X",
        "linux" => "SteamOS + Linux",
        other => other,
    }
}

/// Text of `el` with every `<br>` rendered as a `[br]` marker.
fn text_with_breaks(el: ElementRef<'_>) -> String {
    el.descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(text.to_string()),
            Node::Element(e) if e.name() == "br" => Some("[br]".to_string()),
            _ => None,
        })
        .collect()
}

fn parse_requirements(root: ElementRef<'_>) -> Vec<String> {
    select_all(root, "div.sysreq_contents > div.game_area_sys_req")
        .into_iter()
        .map(|block| {
            let os = os_label(block.value().attr("data-os").unwrap_or_default());
            let spaced = text_with_breaks(block)
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            let content = spaced
                .split("[br]")
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}\n{}", os, content)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STORE: &str = r#"<html><body>
<div class="apphub_AppName">Portal 2</div>
<img class="game_header_image_full" src="https://cdn.steam.test/apps/620/header.jpg?t=1610490805">
<div class="details_block">
  <b>名称:</b>   Portal 2<br>
  <b>类型:</b>
  动作, 冒险<br>
</div>
<div class="details_block">second block</div>
<a class="linkbar" href="https://steamcommunity.com/linkfilter/?url=http://www.thinkwithportals.com/">访问网站</a>
<a class="app_tag">解谜</a><a class="app_tag">  合作  </a>
<div class="user_reviews_summary_row">总体评测：   好评如潮    (1,000)</div>
<table class="game_language_options">
  <tr><th></th><th>界面</th><th>完全音频</th><th>字幕</th></tr>
  <tr><td>英语</td><td class="checkcol"><span>✔</span></td><td class="checkcol"><span>✔</span></td><td class="checkcol"><span>✔</span></td></tr>
  <tr class="unsupported"><td>克林贡语</td><td></td><td></td><td></td></tr>
  <tr><td>简体中文</td><td class="checkcol"><span>✔</span></td><td class="checkcol"></td><td class="checkcol"><span>✔</span></td></tr>
  <tr><td>法语</td><td></td><td></td><td></td></tr>
  <tr><td>德语</td><td class="checkcol"><span>✔</span></td><td></td><td></td></tr>
</table>
<div id="game_area_description"><h2>关于这款游戏</h2><p>The <b>sequel</b> to Portal.</p></div>
<div class="screenshot_holder"><a href="https://steamcommunity.com/linkfilter/?url=https://cdn.steam.test/ss_1.1920x1080.jpg?t=1610490805">s</a></div>
<div class="sysreq_contents">
  <div class="game_area_sys_req" data-os="win">
    <ul><strong>最低配置:</strong><br>
      <ul class="bb_ul"><li><strong>操作系统:</strong> Windows 7<br></li><li><strong>处理器:</strong> 3.0 GHz P4<br></li></ul>
    </ul>
  </div>
</div>
</body></html>"#;

    #[test]
    fn parses_store_page() {
        let info = parse_store_page(STORE, "620");
        assert_eq!(info.steam_id, "620");
        assert_eq!(info.name, "Portal 2");
        assert_eq!(
            info.poster.as_deref(),
            Some("https://cdn.steam.test/apps/620/header.jpg")
        );
        assert_eq!(info.detail, "名称: Portal 2\n类型: 动作, 冒险");
        assert_eq!(
            info.linkbar.as_deref(),
            Some("http://www.thinkwithportals.com/")
        );
        assert_eq!(info.tags, vec!["解谜", "合作"]);
        assert_eq!(info.review, vec!["总体评测: 好评如潮 (1,000)"]);
        assert_eq!(
            info.language,
            vec!["英语 (界面, 完全音频, 字幕)", "简体中文 (界面, 字幕)", "法语"]
        );
        assert_eq!(info.descr, "The [b]sequel[/b] to Portal.");
        assert_eq!(info.screenshot, vec!["https://cdn.steam.test/ss_1.jpg"]);
        assert_eq!(
            info.sysreq,
            vec!["Windows\n最低配置:\n操作系统: Windows 7\n处理器: 3.0 GHz P4"]
        );
    }

    #[test]
    fn name_falls_back_to_itemprop() {
        let info = parse_store_page(
            r#"<html><body><span itemprop="name">Half-Life</span></body></html>"#,
            "70",
        );
        assert_eq!(info.name, "Half-Life");
        assert!(info.poster.is_none());
        assert!(info.language.is_empty());
    }

    #[test]
    fn localized_name_from_jsonp() {
        assert_eq!(
            parse_localized_name(r#"proc({"name_cn":"传送门 2","id":620})"#).as_deref(),
            Some("传送门 2")
        );
        assert_eq!(parse_localized_name(r#"proc({"name_cn":""})"#), None);
        assert_eq!(parse_localized_name("not jsonp"), None);
    }
}
