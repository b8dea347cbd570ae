// ABOUTME: Per-site BBCode templates expressed as ordered entry lists.
// ABOUTME: Labels and ordering follow the conventional PT description layouts for each source.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{images, joined, names, non_empty, Entry, CONTINUATION_INDENT};
use crate::extractors::normalize::indent_continuation;
use crate::record::{
    BangumiInfo, DoubanInfo, EpicInfo, ImdbInfo, IndienovaInfo, SteamInfo, SystemRequirements,
};

const BANGUMI_STAFF_LIMIT: usize = 15;
const BANGUMI_CAST_LIMIT: usize = 9;
const INDIENOVA_TAG_LIMIT: usize = 8;

// Infobox rows that describe the subject rather than its staff.
static BANGUMI_NON_STAFF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(中文名|话数|放送开始|放送星期)").unwrap());

fn indented(text: &str) -> Option<String> {
    non_empty(text).map(|t| indent_continuation(&t, CONTINUATION_INDENT))
}

impl DoubanInfo {
    pub fn template(&self) -> Vec<Entry> {
        let cast_sep = format!("\n{}  　", "　".repeat(4));
        vec![
            Entry::Poster(self.poster.clone()),
            Entry::line("◎译　　名　", joined(&self.trans_title, "/")),
            Entry::line("◎片　　名　", joined(&self.this_title, "/")),
            Entry::line("◎年　　代　", self.year.clone()),
            Entry::line("◎产　　地　", joined(&self.region, " / ")),
            Entry::line("◎类　　别　", joined(&self.genre, " / ")),
            Entry::line("◎语　　言　", joined(&self.language, " / ")),
            Entry::line("◎上映日期　", joined(&self.playdate, " / ")),
            Entry::line("◎IMDb评分  ", self.imdb_rating.clone()),
            Entry::line("◎IMDb链接  ", self.imdb_link.clone()),
            Entry::line("◎豆瓣评分　", self.douban_rating.clone()),
            Entry::line("◎豆瓣链接　", non_empty(&self.douban_link)),
            Entry::line("◎集　　数　", self.episodes.clone()),
            Entry::line("◎片　　长　", self.duration.clone()),
            Entry::line("◎导　　演　", names(&self.director, " / ")),
            Entry::line("◎编　　剧　", names(&self.writer, " / ")),
            Entry::line(
                "◎主　　演　",
                names(&self.cast, &cast_sep).map(|s| s.trim().to_string()),
            ),
            Entry::line("\n◎标　　签　", joined(&self.tags, " | ")),
            Entry::line("\n◎简　　介\n\n　　", indented(&self.introduction)),
            Entry::line(
                "\n◎获奖情况\n\n　　",
                self.awards.as_deref().and_then(indented),
            ),
        ]
    }
}

impl ImdbInfo {
    pub fn template(&self) -> Vec<Entry> {
        vec![
            Entry::Poster(self.poster.clone()),
            Entry::line("Title: ", self.name.clone()),
            Entry::line("Keywords: ", joined(&self.keywords, ", ")),
            Entry::line("Date Published: ", self.date_published.clone()),
            Entry::line("IMDb Rating: ", self.imdb_rating.clone()),
            Entry::line("IMDb Link: ", non_empty(&self.imdb_link)),
            Entry::line("Directors: ", names(&self.directors, " / ")),
            Entry::line("Creators: ", names(&self.creators, " / ")),
            Entry::line("Actors: ", names(&self.actors, " / ")),
            Entry::line(
                "\nIntroduction\n    ",
                self.description.as_deref().and_then(indented),
            ),
        ]
    }
}

impl BangumiInfo {
    pub fn template(&self) -> Vec<Entry> {
        let staff: Vec<String> = self
            .staff
            .iter()
            .filter(|line| !BANGUMI_NON_STAFF_RE.is_match(line))
            .take(BANGUMI_STAFF_LIMIT)
            .cloned()
            .collect();
        let cast: Vec<String> = self.cast.iter().take(BANGUMI_CAST_LIMIT).cloned().collect();

        vec![
            Entry::Poster(self.poster.clone()),
            Entry::section("[b]Story: [/b]", non_empty(&self.story)),
            Entry::section("[b]Staff: [/b]", joined(&staff, "\n")),
            Entry::section("[b]Cast: [/b]", joined(&cast, "\n")),
            Entry::line("", non_empty(&self.alt).map(|alt| format!("(来源于 {} )", alt))),
        ]
    }
}

impl SteamInfo {
    pub fn template(&self) -> Vec<Entry> {
        vec![
            Entry::Poster(self.poster.clone()),
            Entry::Raw("【基本信息】\n\n"),
            Entry::line("中文名: ", self.name_chs.clone()),
            Entry::line("", non_empty(&self.detail)),
            Entry::line("官方网站: ", self.linkbar.clone()),
            Entry::line(
                "Steam页面: ",
                non_empty(&self.steam_id)
                    .map(|id| format!("https://store.steampowered.com/app/{}/", id)),
            ),
            Entry::line("游戏语种: ", joined(&self.language, " | ")),
            Entry::line("标签: ", joined(&self.tags, " | ")),
            Entry::line("\n", joined(&self.review, "\n")),
            Entry::Raw("\n"),
            Entry::section("【游戏简介】", non_empty(&self.descr)),
            Entry::section("【配置需求】", joined(&self.sysreq, "\n")),
            Entry::section("【游戏截图】", images(&self.screenshot)),
        ]
    }
}

impl IndienovaInfo {
    pub fn template(&self) -> Vec<Entry> {
        let tags: Vec<String> = self.cat.iter().take(INDIENOVA_TAG_LIMIT).cloned().collect();
        let links: Vec<String> = self
            .links
            .iter()
            .map(|l| format!("[url={}]{}[/url]", l.url, l.name))
            .collect();

        vec![
            Entry::Poster(self.poster.clone()),
            Entry::Raw("【基本信息】\n\n"),
            Entry::line("中文名称：", non_empty(&self.chinese_title)),
            Entry::line("英文名称：", non_empty(&self.english_title)),
            Entry::line("其他名称：", non_empty(&self.another_title)),
            Entry::line("发行时间：", non_empty(&self.release_date)),
            Entry::line("评分：", self.rate.clone()),
            Entry::line("开发商：", joined(&self.dev, " / ")),
            Entry::line("发行商：", joined(&self.publishers, " / ")),
            Entry::line("", joined(&self.intro_detail, "\n")),
            Entry::line("标签：", joined(&tags, " | ")),
            Entry::line("链接地址：", joined(&links, "  ")),
            Entry::line("价格信息：", joined(&self.price, " / ")),
            Entry::Raw("\n"),
            Entry::section("【游戏简介】", non_empty(&self.descr)),
            Entry::section("【游戏截图】", images(&self.screenshot)),
            Entry::section("【游戏评级】", images(&self.level)),
        ]
    }
}

fn requirement_block(reqs: &[SystemRequirements]) -> Option<String> {
    if reqs.is_empty() {
        return None;
    }
    Some(
        reqs.iter()
            .map(|r| format!("{}\n{}\n", r.system, r.lines.join("\n")))
            .collect(),
    )
}

impl EpicInfo {
    pub fn template(&self) -> Vec<Entry> {
        vec![
            Entry::Poster(self.poster.clone()),
            Entry::Raw("【基本信息】\n\n"),
            Entry::line("游戏名称：", non_empty(&self.name)),
            Entry::line("商店链接：", non_empty(&self.epic_link)),
            Entry::Raw("\n"),
            Entry::section("【支持语言】", joined(&self.language, "\n")),
            Entry::section("【游戏简介】", non_empty(&self.desc)),
            Entry::section("【最低配置】", requirement_block(&self.min_req)),
            Entry::section("【推荐配置】", requirement_block(&self.max_req)),
            Entry::section("【游戏截图】", images(&self.screenshot)),
            Entry::section("【游戏评级】", images(&self.level)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::super::render_entries;
    use super::*;
    use crate::record::{Credit, NamedLink};
    use pretty_assertions::assert_eq;

    fn credit(name: &str) -> Credit {
        Credit {
            name: name.to_string(),
            url: None,
        }
    }

    #[test]
    fn douban_layout() {
        let info = DoubanInfo {
            douban_link: "https://movie.douban.com/subject/1/".to_string(),
            chinese_title: "肖申克的救赎".to_string(),
            trans_title: vec!["肖申克的救赎".to_string(), "月黑高飞".to_string()],
            this_title: vec!["The Shawshank Redemption".to_string()],
            year: Some("1994".to_string()),
            genre: vec!["剧情".to_string(), "犯罪".to_string()],
            douban_rating: Some("9.7/10 from 100 users".to_string()),
            cast: vec![credit("蒂姆·罗宾斯"), credit("摩根·弗里曼")],
            introduction: "第一行\n第二行".to_string(),
            ..Default::default()
        };
        let expected = "◎译　　名　肖申克的救赎/月黑高飞\n\
◎片　　名　The Shawshank Redemption\n\
◎年　　代　1994\n\
◎类　　别　剧情 / 犯罪\n\
◎豆瓣评分　9.7/10 from 100 users\n\
◎豆瓣链接　https://movie.douban.com/subject/1/\n\
◎主　　演　蒂姆·罗宾斯\n　　　　  　摩根·弗里曼\n\
\n◎简　　介\n\n　　第一行\n　　第二行";
        assert_eq!(render_entries(&info.template()), expected);
    }

    #[test]
    fn bangumi_filters_staff_and_limits_cast() {
        let info = BangumiInfo {
            alt: "https://bgm.tv/subject/9".to_string(),
            staff: vec![
                "中文名: 某作品".to_string(),
                "话数: 12".to_string(),
                "导演: 甲".to_string(),
            ],
            cast: (1..=12).map(|i| format!("角色{}: 声优{}", i, i)).collect(),
            ..Default::default()
        };
        let out = render_entries(&info.template());
        assert!(out.starts_with("[b]Staff: [/b]\n\n导演: 甲\n\n[b]Cast: [/b]"));
        assert!(out.contains("角色9: 声优9\n\n(来源于 https://bgm.tv/subject/9 )"));
        assert!(!out.contains("角色10"));
        assert!(!out.contains("中文名"));
    }

    #[test]
    fn steam_always_has_basic_info_header() {
        let info = SteamInfo {
            steam_id: "10".to_string(),
            name: "Counter-Strike".to_string(),
            review: vec!["全部评测: 好评如潮".to_string()],
            screenshot: vec!["https://cdn.test/ss_1.jpg".to_string()],
            ..Default::default()
        };
        assert_eq!(
            render_entries(&info.template()),
            "【基本信息】\n\nSteam页面: https://store.steampowered.com/app/10/\n\n全部评测: 好评如潮\n\n【游戏截图】\n\n[img]https://cdn.test/ss_1.jpg[/img]"
        );
    }

    #[test]
    fn indienova_links_and_tag_limit() {
        let info = IndienovaInfo {
            chinese_title: "死亡细胞".to_string(),
            links: vec![NamedLink {
                name: "Steam".to_string(),
                url: "https://store.steampowered.com/app/588650".to_string(),
            }],
            cat: (1..=10).map(|i| format!("t{}", i)).collect(),
            ..Default::default()
        };
        let out = render_entries(&info.template());
        assert!(out.contains("标签：t1 | t2 | t3 | t4 | t5 | t6 | t7 | t8\n"));
        assert!(out.contains("链接地址：[url=https://store.steampowered.com/app/588650]Steam[/url]"));
    }

    #[test]
    fn epic_requirement_blocks() {
        let info = EpicInfo {
            name: "Hades".to_string(),
            min_req: vec![SystemRequirements {
                system: "Windows".to_string(),
                lines: vec!["OS: Windows 7".to_string(), "Memory: 4 GB".to_string()],
            }],
            ..Default::default()
        };
        assert_eq!(
            render_entries(&info.template()),
            "【基本信息】\n\n游戏名称：Hades\n\n【最低配置】\n\nWindows\nOS: Windows 7\nMemory: 4 GB"
        );
    }
}
