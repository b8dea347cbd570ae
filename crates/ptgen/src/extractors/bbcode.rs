// ABOUTME: Converts an HTML sub-tree into BBCode by walking the ego-tree node graph.
// ABOUTME: Used for store descriptions that must keep emphasis, headings, links and images.

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Node};

static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Convert the children of `el` to BBCode.
pub fn element_to_bbcode(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for child in el.children() {
        walk(child, &mut out);
    }
    tidy(&out)
}

fn walk(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => push_inline_text(out, text),
        Node::Element(el) => {
            let name = el.name();
            match name {
                "script" | "style" | "noscript" => {}
                "br" => out.push('\n'),
                "img" => {
                    if let Some(src) = el.attr("src").map(str::trim).filter(|s| !s.is_empty()) {
                        out.push_str("[img]");
                        out.push_str(src);
                        out.push_str("[/img]");
                    }
                }
                _ => {
                    let (open, close) = tags_for(name, el.attr("href"));
                    out.push_str(&open);
                    for child in node.children() {
                        walk(child, out);
                    }
                    out.push_str(&close);
                }
            }
        }
        _ => {}
    }
}

fn tags_for(name: &str, href: Option<&str>) -> (String, String) {
    let pair = |o: &str, c: &str| (o.to_string(), c.to_string());
    match name {
        "b" | "strong" => pair("[b]", "[/b]"),
        "i" | "em" => pair("[i]", "[/i]"),
        "u" => pair("[u]", "[/u]"),
        "s" | "strike" | "del" => pair("[s]", "[/s]"),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            (format!("\n[{}]", name), format!("[/{}]\n", name))
        }
        "a" => match href.map(str::trim).filter(|h| !h.is_empty()) {
            Some(href) => (format!("[url={}]", href), "[/url]".to_string()),
            None => pair("", ""),
        },
        "ul" => pair("\n[list]\n", "[/list]\n"),
        "ol" => pair("\n[list=1]\n", "[/list]\n"),
        "li" => pair("[*]", "\n"),
        "p" | "div" => pair("\n", "\n"),
        _ => pair("", ""),
    }
}

/// Append text with HTML whitespace semantics: runs collapse to a single space.
fn push_inline_text(out: &mut String, text: &str) {
    let mut last_space = out.ends_with([' ', '\n']) || out.is_empty();
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(ch);
            last_space = false;
        }
    }
}

fn tidy(raw: &str) -> String {
    let trimmed: Vec<&str> = raw.lines().map(str::trim).collect();
    BLANK_RUN_RE
        .replace_all(&trimmed.join("\n"), "\n\n")
        .trim()
        .to_string()
}
