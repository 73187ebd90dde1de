//! DOM-based readers for the banner snippet and the notice document.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Badge, Notice, NoticeDate, Slide, SlideKind};
use crate::render::{DocumentShell, DEFAULT_NOTICE_HEAD};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static SLIDE: Lazy<Selector> = Lazy::new(|| selector("div.slide"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static VIDEO: Lazy<Selector> = Lazy::new(|| selector("video"));
static SOURCE: Lazy<Selector> = Lazy::new(|| selector("source"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));

static HEAD: Lazy<Selector> = Lazy::new(|| selector("head"));
static BODY: Lazy<Selector> = Lazy::new(|| selector("body"));
static NOTICE_TABLE: Lazy<Selector> = Lazy::new(|| selector("table#noticeTable"));
static TBODY: Lazy<Selector> = Lazy::new(|| selector("tbody"));
static BODY_ROW: Lazy<Selector> = Lazy::new(|| selector("tbody > tr"));
static TITLE_CELL: Lazy<Selector> = Lazy::new(|| selector(r#"td[data-label="Title"]"#));
static DATE_CELL: Lazy<Selector> = Lazy::new(|| selector(r#"td[data-label="Date"]"#));
static CONTENT: Lazy<Selector> = Lazy::new(|| selector("div.notice-content"));
static BADGE: Lazy<Selector> = Lazy::new(|| selector("span.badge"));
static DOWNLOAD: Lazy<Selector> = Lazy::new(|| selector("a.download-link"));

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

// ---------------------------------------------------------------- banner

/// Reads slides in document order. Blocks without a media reference under
/// `media_href` are skipped.
pub fn parse_slides(html: &str, media_href: &str) -> Vec<Slide> {
    let doc = Html::parse_document(html);
    let prefix = media_href.trim_start_matches("./");
    let file_of = |src: &str| -> Option<String> {
        src.trim()
            .trim_start_matches("./")
            .strip_prefix(prefix)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    };

    let mut slides = Vec::new();
    for block in doc.select(&SLIDE) {
        // kept verbatim: only the quote pair around image captions is markup
        let caption: String = block
            .select(&PARAGRAPH)
            .next()
            .map(|p| p.text().collect())
            .unwrap_or_default();

        let found = if let Some(img) = block.select(&IMG).next() {
            img.value()
                .attr("src")
                .and_then(file_of)
                .map(|file| (SlideKind::Image, file, strip_quotes(caption.trim())))
        } else if let Some(video) = block.select(&VIDEO).next() {
            video
                .select(&SOURCE)
                .find_map(|s| s.value().attr("src"))
                .or_else(|| video.value().attr("src"))
                .and_then(file_of)
                .map(|file| (SlideKind::Video, file, caption.clone()))
        } else {
            None
        };

        match found {
            Some((kind, file, caption)) => slides.push(Slide { kind, file, caption }),
            None => debug!("skipping slide block without a media reference: {}", block.html()),
        }
    }
    slides
}

fn strip_quotes(text: &str) -> String {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .to_string()
}

// ---------------------------------------------------------------- notices

/// A notice document split into the rows it stores and the markup around them.
#[derive(Debug, Clone)]
pub struct NoticeDocument {
    pub shell: DocumentShell,
    pub notices: Vec<Notice>,
    /// True when the table or its body had to be synthesised.
    pub repaired: bool,
    /// Rows that carried no `data-id` and were given one while parsing.
    pub assigned_ids: usize,
}

impl NoticeDocument {
    /// Whether writing the document back would change it structurally.
    pub fn needs_rewrite(&self) -> bool {
        self.repaired || self.assigned_ids > 0
    }
}

impl Default for NoticeDocument {
    fn default() -> Self {
        Self {
            shell: DocumentShell::default(),
            notices: Vec::new(),
            repaired: false,
            assigned_ids: 0,
        }
    }
}

pub fn parse_notice_document(html: &str) -> NoticeDocument {
    let doc = Html::parse_document(html);

    let head = doc
        .select(&HEAD)
        .next()
        .map(|h| h.inner_html())
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NOTICE_HEAD.to_string());
    let body_html = doc.select(&BODY).next().map(|b| b.inner_html()).unwrap_or_default();

    let Some(table) = doc.select(&NOTICE_TABLE).next() else {
        warn!("notice document has no #noticeTable; appending one");
        return NoticeDocument {
            shell: DocumentShell {
                head,
                before_table: format!("{}\n    ", body_html.trim_end()),
                after_table: "\n".to_string(),
            },
            notices: Vec::new(),
            repaired: true,
            assigned_ids: 0,
        };
    };

    let table_html = table.html();
    let (before_table, after_table) = match body_html.find(&table_html) {
        Some(at) => (
            body_html[..at].to_string(),
            body_html[at + table_html.len()..].to_string(),
        ),
        None => {
            warn!("could not locate #noticeTable inside <body>; surrounding markup is reset");
            let shell = DocumentShell::default();
            (shell.before_table, shell.after_table)
        }
    };

    let repaired = table.select(&TBODY).next().is_none();
    if repaired {
        warn!("#noticeTable has no <tbody>; rebuilding it");
    }

    let mut assigned_ids = 0;
    let mut notices = Vec::new();
    for (notice, had_id) in table.select(&BODY_ROW).filter_map(parse_notice_row) {
        if !had_id {
            assigned_ids += 1;
        }
        notices.push(notice);
    }
    NoticeDocument {
        shell: DocumentShell { head, before_table, after_table },
        notices,
        repaired,
        assigned_ids,
    }
}

fn parse_notice_row(row: ElementRef<'_>) -> Option<(Notice, bool)> {
    let title = row.select(&TITLE_CELL).next()?;
    let content = row.select(&CONTENT).next()?;
    let date = row.select(&DATE_CELL).next()?;
    let badge = row.select(&BADGE).next()?;

    let file_link = row
        .select(&DOWNLOAD)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string);
    // Rows written before ids existed get one now and keep it on the next save.
    let stored_id = row
        .value()
        .attr("data-id")
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok());
    let had_id = stored_id.is_some();
    let id = stored_id.unwrap_or_else(Uuid::new_v4);
    let created_at = row
        .value()
        .attr("data-created")
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|t| t.with_timezone(&Utc));

    let notice = Notice {
        id,
        title: text_of(title),
        content: text_of(content),
        date: NoticeDate::from_stored(date.value().attr("data-date").unwrap_or_default()),
        badge: Badge::from_rendered(&badge.text().collect::<String>()),
        file_link,
        created_at,
    };
    Some((notice, had_id))
}
