//! Embedded folder view parser
//!
//! Each entry in the view is a `.flip-entry` element shaped like:
//!
//! ```html
//! <div class="flip-entry" id="entry-1AbC...">
//!   <a href="https://drive.google.com/file/d/1AbC.../view?usp=drive_web">
//!     <div class="flip-entry-title">track.mp3</div>
//!     <div class="flip-entry-last-modified"><div>Jan 27</div></div>
//!   </a>
//! </div>
//! ```
//!
//! Parsing is all-or-nothing: the first malformed entry aborts the whole
//! listing, so upstream format drift surfaces as an error instead of a
//! silently shorter list.

use std::sync::OnceLock;

use adx_common::Clock;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use super::date::{self, NormalizeError};
use super::{FolderItem, ItemKind};

const ENTRY_ID_PREFIX: &str = "entry-";
const FOLDER_PATH_PREFIX: &str = "/drive/folders";
const FILE_PATH_PREFIX: &str = "/file/d";

/// Folder view parse errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed .flip-entry id: {0:?}")]
    MalformedId(String),

    #[error("entry {id}: link has no href")]
    MissingHref { id: String },

    #[error("entry {id}: unrecognized link target {target:?}")]
    UnrecognizedTarget { id: String, target: String },

    #[error("entry {id}: empty title")]
    MissingTitle { id: String },

    #[error("entry {id}: {source}")]
    MalformedDate {
        id: String,
        #[source]
        source: NormalizeError,
    },
}

struct Selectors {
    entry: Selector,
    link: Selector,
    title: Selector,
    last_modified: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |s: &str| Selector::parse(s).expect("static selector is valid");
        Selectors {
            entry: parse(".flip-entry"),
            link: parse("a"),
            title: parse(".flip-entry-title"),
            last_modified: parse(".flip-entry-last-modified > div"),
        }
    })
}

/// Parse folder view markup into its entries, in document order
pub fn parse(markup: &str, clock: &dyn Clock) -> Result<Vec<FolderItem>, ParseError> {
    let html = Html::parse_document(markup);
    let sel = selectors();

    html.select(&sel.entry)
        .map(|entry| parse_entry(entry, sel, clock))
        .collect()
}

fn parse_entry(
    entry: ElementRef<'_>,
    sel: &Selectors,
    clock: &dyn Clock,
) -> Result<FolderItem, ParseError> {
    let raw_id = entry.value().attr("id").unwrap_or_default();
    let id = match raw_id.strip_prefix(ENTRY_ID_PREFIX) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(ParseError::MalformedId(raw_id.to_string())),
    };

    let href = entry
        .select(&sel.link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| ParseError::MissingHref { id: id.clone() })?;

    let kind = classify(href).ok_or_else(|| ParseError::UnrecognizedTarget {
        id: id.clone(),
        target: href.to_string(),
    })?;

    let name = first_text(entry, &sel.title);
    if name.is_empty() {
        return Err(ParseError::MissingTitle { id });
    }

    let last_modified = date::normalize(&first_text(entry, &sel.last_modified), clock)
        .map_err(|source| ParseError::MalformedDate {
            id: id.clone(),
            source,
        })?;

    Ok(FolderItem {
        id,
        name,
        kind,
        last_modified,
    })
}

/// Classify an entry by the path of its link target
fn classify(href: &str) -> Option<ItemKind> {
    let path = if href.starts_with('/') {
        href.split(['?', '#']).next().unwrap_or_default().to_string()
    } else {
        Url::parse(href).ok()?.path().to_string()
    };

    if path.starts_with(FOLDER_PATH_PREFIX) {
        Some(ItemKind::Folder)
    } else if path.starts_with(FILE_PATH_PREFIX) {
        Some(ItemKind::File)
    } else {
        None
    }
}

fn first_text(entry: ElementRef<'_>, selector: &Selector) -> String {
    entry
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adx_common::time::FixedClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap())
    }

    fn entry(id: &str, href: Option<&str>, title: &str, modified: &str) -> String {
        let open = match href {
            Some(href) => format!(r#"<a href="{}" target="_blank">"#, href),
            None => "<a>".to_string(),
        };
        format!(
            r#"<div class="flip-entry" id="{id}" tabindex="0">
  <div class="flip-entry-info">
    {open}
      <div class="flip-entry-list-icon"><img src="icon.png"></div>
      <div class="flip-entry-title">{title}</div>
      <div class="flip-entry-last-modified"><div>{modified}</div></div>
    </a>
  </div>
</div>"#
        )
    }

    fn view(entries: &[String]) -> String {
        format!(
            r#"<html><body><div class="flip-entries">{}</div></body></html>"#,
            entries.concat()
        )
    }

    const FILE_ID: &str = "1aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const SUB_ID: &str = "1bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn test_parse_files_and_folders_in_order() {
        let markup = view(&[
            entry(
                &format!("entry-{}", FILE_ID),
                Some(&format!("https://drive.google.com/file/d/{}/view?usp=drive_web", FILE_ID)),
                "  track.mp3 \n",
                "Jan 27",
            ),
            entry(
                &format!("entry-{}", SUB_ID),
                Some(&format!("https://drive.google.com/drive/folders/{}", SUB_ID)),
                "extras",
                "03/05/24",
            ),
        ]);

        let items = parse(&markup, &clock()).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, FILE_ID);
        assert_eq!(items[0].name, "track.mp3");
        assert_eq!(items[0].kind, ItemKind::File);
        assert_eq!(
            items[0].last_modified,
            Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap()
        );

        assert_eq!(items[1].id, SUB_ID);
        assert_eq!(items[1].name, "extras");
        assert_eq!(items[1].kind, ItemKind::Folder);
        assert_eq!(
            items[1].last_modified,
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_relative_href_is_classified() {
        let markup = view(&[entry("entry-abc", Some("/file/d/abc/view"), "pv.mp4", "Feb 2")]);
        let items = parse(&markup, &clock()).unwrap();
        assert_eq!(items[0].kind, ItemKind::File);
    }

    #[test]
    fn test_empty_view_yields_empty_listing() {
        let items = parse(&view(&[]), &clock()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_missing_id_prefix_aborts_whole_listing() {
        let markup = view(&[
            entry("entry-good", Some("/file/d/good"), "bg.png", "Jan 1"),
            entry("item-bad", Some("/file/d/bad"), "pv.mp4", "Jan 1"),
        ]);
        assert_eq!(
            parse(&markup, &clock()),
            Err(ParseError::MalformedId("item-bad".to_string()))
        );
    }

    #[test]
    fn test_bare_prefix_is_malformed_id() {
        let markup = view(&[entry("entry-", Some("/file/d/x"), "bg.png", "Jan 1")]);
        assert!(matches!(
            parse(&markup, &clock()),
            Err(ParseError::MalformedId(_))
        ));
    }

    #[test]
    fn test_missing_href_aborts_whole_listing() {
        let markup = view(&[
            entry("entry-good", Some("/file/d/good"), "bg.png", "Jan 1"),
            entry("entry-nolink", None, "pv.mp4", "Jan 1"),
        ]);
        assert_eq!(
            parse(&markup, &clock()),
            Err(ParseError::MissingHref {
                id: "nolink".to_string()
            })
        );
    }

    #[test]
    fn test_unrecognized_target_aborts_whole_listing() {
        let markup = view(&[
            entry("entry-good", Some("/file/d/good"), "bg.png", "Jan 1"),
            entry(
                "entry-doc",
                Some("https://docs.google.com/document/d/doc/edit"),
                "notes",
                "Jan 1",
            ),
        ]);
        assert!(matches!(
            parse(&markup, &clock()),
            Err(ParseError::UnrecognizedTarget { id, .. }) if id == "doc"
        ));
    }

    #[test]
    fn test_malformed_date_aborts_whole_listing() {
        let markup = view(&[entry("entry-x", Some("/file/d/x"), "bg.png", "Xyz 10")]);
        assert!(matches!(
            parse(&markup, &clock()),
            Err(ParseError::MalformedDate {
                source: NormalizeError::UnrecognizedMonth(_),
                ..
            })
        ));
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let markup = view(&[entry("entry-x", Some("/file/d/x"), "   ", "Jan 1")]);
        assert!(matches!(
            parse(&markup, &clock()),
            Err(ParseError::MissingTitle { .. })
        ));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("/drive/folders/abc"), Some(ItemKind::Folder));
        assert_eq!(classify("/file/d/abc/view?x=/drive/folders"), Some(ItemKind::File));
        assert_eq!(
            classify("https://drive.google.com/drive/folders/abc?resourcekey=1"),
            Some(ItemKind::Folder)
        );
        assert_eq!(classify("https://drive.google.com/open?id=abc"), None);
        assert_eq!(classify("not a url"), None);
    }
}
