//! Fenced code block scanning.
//!
//! A fence opens on a line of three or more backticks (indented at most three
//! spaces) followed by an optional info string, and closes on a line holding
//! only at least as many backticks. An unclosed fence runs to the end of text.

use std::sync::LazyLock;

use regex::Regex;

static OPENING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(`{3,})[ \t]*([^`\s]*)[^`]*$").expect("valid fence regex")
});

static CLOSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,})[ \t]*$").expect("valid fence regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Lowercased info string; empty when the fence has none.
    pub info: String,
    pub body: &'a str,
    pub closed: bool,
}

/// All fenced blocks in order of appearance.
pub fn blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut found = Vec::new();
    let mut open: Option<(usize, String, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        let Some((width, body_start)) = open.as_ref().map(|(w, _, b)| (*w, *b)) else {
            if let Some(caps) = OPENING.captures(content) {
                let width = caps[1].len();
                let info = caps[2].to_ascii_lowercase();
                open = Some((width, info, offset));
            }
            continue;
        };

        let closes = CLOSING
            .captures(content)
            .is_some_and(|caps| caps[1].len() >= width);
        if !closes {
            continue;
        }
        if let Some((_, info, _)) = open.take() {
            found.push(FencedBlock {
                info,
                body: trim_newline(&text[body_start..start]),
                closed: true,
            });
        }
    }

    if let Some((_, info, body_start)) = open {
        found.push(FencedBlock {
            info,
            body: trim_newline(&text[body_start.min(text.len())..]),
            closed: false,
        });
    }

    found
}

fn trim_newline(body: &str) -> &str {
    body.strip_suffix('\n')
        .map(|b| b.strip_suffix('\r').unwrap_or(b))
        .unwrap_or(body)
}
