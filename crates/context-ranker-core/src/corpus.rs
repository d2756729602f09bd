//! Corpus export parsing.
//!
//! The export is a flat text file of blank-line-delimited blocks. Within a
//! block, lines are recognized by prefix:
//!
//! | Prefix | Meaning |
//! |--------|---------|
//! | `# ` | document title |
//! | `URL: ` | document url (path or absolute) |
//! | `##` | heading (all leading `#` stripped) |
//!
//! Any other line is body text. The whole block is kept verbatim as the
//! document content. Blocks without a title or url are navigation residue and
//! are dropped.

use crate::models::Document;

const TITLE_PREFIX: &str = "# ";
const URL_PREFIX: &str = "URL: ";
const HEADING_PREFIX: &str = "##";

/// Parse a raw corpus export into documents, assigning ordinal ids in order.
pub fn parse_export(raw: &str) -> Vec<Document> {
    split_blocks(raw)
        .into_iter()
        .filter_map(|block| parse_block(&block))
        .enumerate()
        .map(|(ordinal, mut doc)| {
            doc.id = ordinal.to_string();
            doc
        })
        .collect()
}

/// Split the export on blank (whitespace-only) lines.
fn split_blocks(raw: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
}

fn parse_block(block: &str) -> Option<Document> {
    let mut title: Option<&str> = None;
    let mut url: Option<&str> = None;
    let mut headings = Vec::new();

    for line in block.lines() {
        if let Some(rest) = line.strip_prefix(TITLE_PREFIX) {
            if title.is_none() {
                title = Some(rest.trim());
            }
        } else if let Some(rest) = line.strip_prefix(URL_PREFIX) {
            if url.is_none() {
                url = Some(rest.trim());
            }
        } else if line.starts_with(HEADING_PREFIX) {
            let heading = line.trim_start_matches('#').trim();
            if !heading.is_empty() {
                headings.push(heading.to_string());
            }
        }
    }

    let title = title.filter(|t| !t.is_empty())?;
    let url = url.filter(|u| !u.is_empty())?;

    Some(Document {
        id: String::new(),
        title: title.to_string(),
        url: url.to_string(),
        content: block.to_string(),
        headings,
    })
}

/// Top-level path segment of a url, used as the diversity section key.
///
/// Accepts both bare paths (`/docs/nodes`) and absolute urls
/// (`https://host/docs/nodes`). Returns `""` for the root.
pub fn url_section(url: &str) -> &str {
    let path = match url.find("://") {
        Some(scheme_end) => {
            let after_scheme = &url[scheme_end + 3..];
            after_scheme
                .find('/')
                .map(|i| &after_scheme[i..])
                .unwrap_or("")
        }
        None => url,
    };

    path.trim_start_matches('/')
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
}
