use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Id = Uuid;

/// Caption given to a slide added without one.
pub const DEFAULT_CAPTION: &str = "New Caption";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("date must be in YYYY/MM/DD format, got {0:?}")]
    BadDate(String),
    #[error("unsupported media file {0:?} (expected jpg, jpeg, png or mp4)")]
    BadMedia(String),
}

// ---------------------------------------------------------------- slides

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Image,
    Video,
}

impl SlideKind {
    /// Classifies a media file by extension. Only `.mp4` is treated as video.
    pub fn for_file(name: &str) -> Result<Self, ValidationError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("mp4") => Ok(SlideKind::Video),
            Some("jpg" | "jpeg" | "png") => Ok(SlideKind::Image),
            _ => Err(ValidationError::BadMedia(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlideKind::Image => "image",
            SlideKind::Video => "video",
        }
    }
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub kind: SlideKind,
    pub file: String, // name inside the media directory
    pub caption: String,
}

// ---------------------------------------------------------------- notices

/// A `YYYY/MM/DD` numeral date. The calendar is the local one (Bikram Sambat),
/// so only the shape is checked, never the day count of a month.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoticeDate(String);

impl NoticeDate {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split('/').collect();
        // widths count characters so local-script numerals (२०८१/०४/१५) pass too
        let well_formed = parts.len() == 3
            && parts.iter().zip([4, 2, 2]).all(|(p, width)| {
                p.chars().count() == width && p.chars().all(char::is_numeric)
            });
        if !well_formed {
            return Err(ValidationError::BadDate(raw.to_string()));
        }
        Ok(NoticeDate(raw.to_string()))
    }

    /// Accepts whatever an existing document holds so that hand-edited rows
    /// survive a rewrite.
    pub fn from_stored(raw: &str) -> Self {
        NoticeDate(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Zero-padded `YYYYMMDD` used for the `data-sort` attribute.
    pub fn sort_key(&self) -> String {
        let parts: Vec<&str> = self.0.split('/').collect();
        match parts.as_slice() {
            [y, m, d] => format!("{y}{m:0>2}{d:0>2}"),
            _ => self.0.chars().filter(|c| c.is_numeric()).collect(),
        }
    }
}

impl fmt::Display for NoticeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Icons prefixed to the badge label when rendered.
pub const BADGE_ICONS: [&str; 4] = ["🔥", "⭐", "🎉", "📌"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeStyle {
    Urgent,
    Important,
    Holiday,
    Normal,
}

impl BadgeStyle {
    pub fn lookup(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "urgent" => BadgeStyle::Urgent,
            "important" => BadgeStyle::Important,
            "holiday" => BadgeStyle::Holiday,
            _ => BadgeStyle::Normal,
        }
    }

    pub fn class_pair(&self) -> &'static str {
        match self {
            BadgeStyle::Urgent => "bg-red-100 text-red-800",
            BadgeStyle::Important => "bg-blue-100 text-blue-800",
            BadgeStyle::Holiday => "bg-green-100 text-green-800",
            BadgeStyle::Normal => "bg-yellow-100 text-yellow-800",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            BadgeStyle::Urgent => BADGE_ICONS[0],
            BadgeStyle::Important => BADGE_ICONS[1],
            BadgeStyle::Holiday => BADGE_ICONS[2],
            BadgeStyle::Normal => BADGE_ICONS[3],
        }
    }
}

/// Free-text category label. Unknown labels are kept verbatim and styled as Normal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Badge(String);

impl Badge {
    pub fn new(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() {
            Badge("Normal".to_string())
        } else {
            Badge(label.to_string())
        }
    }

    /// Reads a label back from rendered badge text such as `"🔥 Urgent"`.
    pub fn from_rendered(text: &str) -> Self {
        let mut label = text.to_string();
        for icon in BADGE_ICONS {
            label = label.replace(icon, "");
        }
        Badge::new(&label)
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    pub fn style(&self) -> BadgeStyle {
        BadgeStyle::lookup(&self.0)
    }
}

impl Default for Badge {
    fn default() -> Self {
        Badge::new("")
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Natural key of a notice. Not unique: lookups take the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeKey {
    pub title: String,
    pub date: String,
}

impl NoticeKey {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self { title: title.into(), date: date.into() }
    }
}

impl fmt::Display for NoticeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.title, self.date)
    }
}

/// How an update or delete addresses its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeRef {
    Id(Id),
    Key(NoticeKey),
}

impl fmt::Display for NoticeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeRef::Id(id) => write!(f, "id {id}"),
            NoticeRef::Key(key) => key.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub date: NoticeDate,
    pub badge: Badge,
    pub file_link: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notice {
    pub fn create(fields: NoticeFields, file_link: Option<String>) -> Self {
        Notice {
            id: Uuid::new_v4(),
            title: fields.title,
            content: fields.content,
            date: fields.date,
            badge: fields.badge,
            file_link,
            created_at: Some(Utc::now()),
        }
    }

    /// Builds the replacement record for an edit; identity is kept.
    pub fn revise(&self, fields: NoticeFields, file_link: Option<String>) -> Self {
        Notice {
            id: self.id,
            title: fields.title,
            content: fields.content,
            date: fields.date,
            badge: fields.badge,
            file_link,
            created_at: self.created_at,
        }
    }

    pub fn key(&self) -> NoticeKey {
        NoticeKey::new(self.title.clone(), self.date.as_str())
    }

    pub fn matches_key(&self, key: &NoticeKey) -> bool {
        self.title.trim() == key.title.trim() && self.date.as_str() == key.date.trim()
    }

    pub fn is(&self, target: &NoticeRef) -> bool {
        match target {
            NoticeRef::Id(id) => self.id == *id,
            NoticeRef::Key(key) => self.matches_key(key),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_link
            .as_deref()
            .map(|link| link.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(link))
    }

    pub fn matches(&self, field: SearchField, term: &str) -> bool {
        let term = term.trim();
        let needle = term.to_lowercase();
        match field {
            SearchField::Title => self.title.trim().to_lowercase().contains(&needle),
            SearchField::Date => self.date.as_str().contains(term),
            SearchField::Badge => self.badge.label().to_lowercase().contains(&needle),
            SearchField::Content => self.content.trim().to_lowercase().contains(&needle),
        }
    }
}

/// Raw form input for a notice, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeInput {
    pub title: String,
    pub content: String,
    pub date: String,
    pub badge: String,
}

/// Validated notice fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeFields {
    pub title: String,
    pub content: String,
    pub date: NoticeDate,
    pub badge: Badge,
}

impl NoticeInput {
    pub fn validate(&self) -> Result<NoticeFields, ValidationError> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() {
            return Err(ValidationError::Missing("title"));
        }
        if content.is_empty() {
            return Err(ValidationError::Missing("content"));
        }
        if self.date.trim().is_empty() {
            return Err(ValidationError::Missing("date"));
        }
        Ok(NoticeFields {
            title: title.to_string(),
            content: content.to_string(),
            date: NoticeDate::parse(&self.date)?,
            badge: Badge::new(&self.badge),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Date,
    Badge,
    Content,
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(SearchField::Title),
            "date" => Ok(SearchField::Date),
            "badge" => Ok(SearchField::Badge),
            "content" => Ok(SearchField::Content),
            other => Err(format!("unknown search field {other:?} (title, date, badge, content)")),
        }
    }
}

/// A notice as presented by the list view.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeView {
    #[serde(flatten)]
    pub notice: Notice,
    pub has_file: bool,
    pub file_name: Option<String>,
    pub file_exists: bool,
}
