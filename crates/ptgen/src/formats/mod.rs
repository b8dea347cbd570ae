// ABOUTME: Declarative BBCode template engine turning a finalized record into formatted text.
// ABOUTME: Each site supplies an ordered list of entries; absent values are skipped.

//! Formatted text rendering.
//!
//! A template is a fixed ordered list of [`Entry`] values. Rendering walks
//! the list, emits each entry whose backing value is present and non-empty,
//! and trims the result. Rendering is pure: the same record always yields
//! byte-identical output.

mod templates;

use crate::record::{Credit, Record, SiteDetails};

/// Continuation prefix for multi-line free-text values.
pub const CONTINUATION_INDENT: &str = "　　";

/// One template entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// `[img]{url}[/img]` followed by a blank line.
    Poster(Option<String>),
    /// `{label}{value}` and a newline.
    Line {
        label: &'static str,
        value: Option<String>,
    },
    /// `{heading}`, a blank line, `{body}`, a blank line.
    Section {
        heading: &'static str,
        body: Option<String>,
    },
    /// Emitted unconditionally.
    Raw(&'static str),
}

impl Entry {
    pub fn line(label: &'static str, value: Option<String>) -> Self {
        Entry::Line { label, value }
    }

    pub fn section(heading: &'static str, body: Option<String>) -> Self {
        Entry::Section { heading, body }
    }
}

/// Render a template.
pub fn render_entries(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        match entry {
            Entry::Poster(url) => {
                if let Some(url) = present(url) {
                    out.push_str(&format!("[img]{}[/img]\n\n", url));
                }
            }
            Entry::Line { label, value } => {
                if let Some(value) = present(value) {
                    out.push_str(label);
                    out.push_str(value);
                    out.push('\n');
                }
            }
            Entry::Section { heading, body } => {
                if let Some(body) = present(body) {
                    out.push_str(heading);
                    out.push_str("\n\n");
                    out.push_str(body);
                    out.push_str("\n\n");
                }
            }
            Entry::Raw(text) => out.push_str(text),
        }
    }
    out.trim().to_string()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Render the formatted text of a record. Unsuccessful records render empty.
pub fn render(record: &Record) -> String {
    match (&record.details, record.success) {
        (Some(details), true) => render_details(details),
        _ => String::new(),
    }
}

/// Render site details with that site's template.
pub fn render_details(details: &SiteDetails) -> String {
    let entries = match details {
        SiteDetails::Douban(info) => info.template(),
        SiteDetails::Imdb(info) => info.template(),
        SiteDetails::Bangumi(info) => info.template(),
        SiteDetails::Steam(info) => info.template(),
        SiteDetails::Indienova(info) => info.template(),
        SiteDetails::Epic(info) => info.template(),
    };
    render_entries(&entries)
}

/// Join a list, or `None` when it is empty.
pub(crate) fn joined(items: &[String], sep: &str) -> Option<String> {
    (!items.is_empty()).then(|| items.join(sep))
}

/// Join credited names, or `None` when there are none.
pub(crate) fn names(credits: &[Credit], sep: &str) -> Option<String> {
    let names: Vec<String> = credits.iter().map(|c| c.name.clone()).collect();
    joined(&names, sep)
}

/// One `[img]` line per URL.
pub(crate) fn images(urls: &[String]) -> Option<String> {
    let lines: Vec<String> = urls.iter().map(|u| format!("[img]{}[/img]", u)).collect();
    joined(&lines, "\n")
}

/// `Some` for a non-empty string.
pub(crate) fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
