// ABOUTME: Site tag enum, the URL pattern table and the identifier resolver.
// ABOUTME: Resolves a free-form resource URL or an explicit (site, sid) pair into a dispatch target.

//! Identifier resolution.
//!
//! Each supported upstream has exactly one pattern whose single capture group
//! yields the subject id. Patterns are tried in declaration order and the
//! first match wins. Resolution is pure string matching; nothing is fetched.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A supported upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Douban,
    Imdb,
    Bangumi,
    Steam,
    Indienova,
    Epic,
}

impl Site {
    /// All sites in pattern-table order.
    pub const ALL: [Site; 6] = [
        Site::Douban,
        Site::Imdb,
        Site::Bangumi,
        Site::Steam,
        Site::Indienova,
        Site::Epic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Douban => "douban",
            Site::Imdb => "imdb",
            Site::Bangumi => "bangumi",
            Site::Steam => "steam",
            Site::Indienova => "indienova",
            Site::Epic => "epic",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the six known site tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown site tag: {0}")]
pub struct UnknownSite(pub String);

impl FromStr for Site {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Site::ALL
            .into_iter()
            .find(|site| site.as_str() == s)
            .ok_or_else(|| UnknownSite(s.to_string()))
    }
}

/// One row of the pattern table.
pub struct PatternEntry {
    pub site: Site,
    pub pattern: Regex,
}

fn entry(site: Site, pattern: &str) -> PatternEntry {
    PatternEntry {
        site,
        pattern: Regex::new(pattern).unwrap(),
    }
}

// Only group 1 may capture, and it must be the subject id.
static PATTERN_TABLE: Lazy<Vec<PatternEntry>> = Lazy::new(|| {
    vec![
        entry(
            Site::Douban,
            r"(?:https?://)?(?:(?:movie|www)\.)?douban\.com/(?:subject|movie)/(\d+)/?",
        ),
        entry(Site::Imdb, r"(?:https?://)?(?:www\.)?imdb\.com/title/(tt\d+)/?"),
        entry(
            Site::Bangumi,
            r"(?:https?://)?(?:bgm\.tv|bangumi\.tv|chii\.in)/subject/(\d+)/?",
        ),
        entry(
            Site::Steam,
            r"(?:https?://)?(?:store\.)?steam(?:powered|community)\.com/app/(\d+)/?",
        ),
        entry(Site::Indienova, r"(?:https?://)?indienova\.com/game/(\S+)"),
        entry(
            Site::Epic,
            r"(?:https?://)?www\.epicgames\.com/store/[a-zA-Z-]+/product/(\S+)/\S?",
        ),
    ]
});

/// The pattern table in declaration order.
pub fn pattern_table() -> &'static [PatternEntry] {
    &PATTERN_TABLE
}

/// A dispatch target produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub site: Site,
    pub sid: String,
}

/// What the caller supplied to identify a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<'a> {
    Url(&'a str),
    Explicit { site: &'a str, sid: &'a str },
}

/// Why a target could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// No pattern matched the URL.
    NoMatch,
    /// The explicit site tag is not in the table.
    UnknownSite(String),
}

/// Find the site and subject id for a free-form URL.
pub fn resolve_url(url: &str) -> Option<Resolution> {
    pattern_table().iter().find_map(|row| {
        row.pattern.captures(url).and_then(|caps| {
            caps.get(1).map(|m| Resolution {
                site: row.site,
                sid: m.as_str().to_string(),
            })
        })
    })
}

/// Resolve either input shape into a dispatch target.
pub fn resolve(target: Target<'_>) -> Result<Resolution, Unresolved> {
    match target {
        Target::Url(url) => resolve_url(url).ok_or(Unresolved::NoMatch),
        Target::Explicit { site, sid } => {
            let site = site
                .parse::<Site>()
                .map_err(|e| Unresolved::UnknownSite(e.0))?;
            Ok(Resolution {
                site,
                sid: sid.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_douban_subject_url() {
        let res = resolve(Target::Url("https://movie.douban.com/subject/12345/")).unwrap();
        assert_eq!(
            res,
            Resolution {
                site: Site::Douban,
                sid: "12345".to_string()
            }
        );
    }

    #[test]
    fn unrecognized_domain_is_unresolved() {
        assert_eq!(
            resolve(Target::Url("https://example.com/subject/12345/")),
            Err(Unresolved::NoMatch)
        );
    }

    #[test]
    fn resolves_each_site() {
        let cases = [
            ("https://www.imdb.com/title/tt0111161/", Site::Imdb, "tt0111161"),
            ("http://bangumi.tv/subject/253", Site::Bangumi, "253"),
            ("chii.in/subject/9", Site::Bangumi, "9"),
            (
                "https://store.steampowered.com/app/570/Dota_2/",
                Site::Steam,
                "570",
            ),
            (
                "https://indienova.com/game/dead-cells",
                Site::Indienova,
                "dead-cells",
            ),
            (
                "https://www.epicgames.com/store/zh-CN/product/hades/home",
                Site::Epic,
                "hades",
            ),
        ];
        for (url, site, sid) in cases {
            let res = resolve_url(url).unwrap_or_else(|| panic!("no match for {url}"));
            assert_eq!(res.site, site, "{url}");
            assert_eq!(res.sid, sid, "{url}");
        }
    }

    #[test]
    fn explicit_pair_validates_site() {
        let res = resolve(Target::Explicit {
            site: "steam",
            sid: "10",
        })
        .unwrap();
        assert_eq!(res.site, Site::Steam);
        assert_eq!(res.sid, "10");

        assert_eq!(
            resolve(Target::Explicit {
                site: "netflix",
                sid: "1"
            }),
            Err(Unresolved::UnknownSite("netflix".to_string()))
        );
    }

    #[test]
    fn patterns_have_single_capture_group() {
        for row in pattern_table() {
            // captures_len counts the implicit whole-match group
            assert_eq!(row.pattern.captures_len(), 2, "{}", row.site);
        }
    }

    #[test]
    fn site_round_trips_through_str() {
        for site in Site::ALL {
            assert_eq!(site.as_str().parse::<Site>().unwrap(), site);
        }
        assert!("Douban".parse::<Site>().is_err());
    }
}
