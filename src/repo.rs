use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Ordered slide list; the whole list is read and written at once.
pub trait SlideRepo: Send + Sync {
    fn load_slides(&self) -> RepoResult<Vec<Slide>>;
    fn save_slides(&self, slides: &[Slide]) -> RepoResult<()>;
}

/// Notice records in stored order (most recently inserted first).
pub trait NoticeRepo: Send + Sync {
    fn list_notices(&self) -> RepoResult<Vec<Notice>>;
    fn insert_notice(&self, notice: Notice) -> RepoResult<Notice>;
    /// Replaces the first record matching `target`; returns the record it replaced.
    fn update_notice(&self, target: &NoticeRef, replacement: Notice) -> RepoResult<Notice>;
    /// Removes the first record matching `target` and returns it.
    fn delete_notice(&self, target: &NoticeRef) -> RepoResult<Notice>;
}

pub trait Repo: SlideRepo + NoticeRepo {}

impl<T> Repo for T where T: SlideRepo + NoticeRepo {}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> RepoError + '_ {
    move |source| RepoError::Io { path: path.to_path_buf(), source }
}

/// Reads a file, `None` when it does not exist.
pub(crate) fn read_optional(path: &Path) -> RepoResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path)(e)),
    }
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> RepoResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err(dir))?;
    }
    fs::write(path, contents).map_err(io_err(path))
}

fn position_of(notices: &[Notice], target: &NoticeRef) -> RepoResult<usize> {
    notices.iter().position(|n| n.is(target)).ok_or(RepoError::NotFound)
}

/// The HTML files themselves are the store of record.
pub mod html {
    use super::*;
    use tracing::info;

    use crate::parse::{parse_notice_document, parse_slides, NoticeDocument};
    use crate::render::{render_banner, render_notice_document};

    /// Both HTML files behind one repository handle.
    pub struct HtmlRepo {
        pub slides: HtmlSlideRepo,
        pub notices: HtmlNoticeRepo,
    }

    impl HtmlRepo {
        pub fn new(slides: HtmlSlideRepo, notices: HtmlNoticeRepo) -> Self {
            Self { slides, notices }
        }
    }

    impl SlideRepo for HtmlRepo {
        fn load_slides(&self) -> RepoResult<Vec<Slide>> {
            self.slides.load_slides()
        }
        fn save_slides(&self, slides: &[Slide]) -> RepoResult<()> {
            self.slides.save_slides(slides)
        }
    }

    impl NoticeRepo for HtmlRepo {
        fn list_notices(&self) -> RepoResult<Vec<Notice>> {
            self.notices.list_notices()
        }
        fn insert_notice(&self, notice: Notice) -> RepoResult<Notice> {
            self.notices.insert_notice(notice)
        }
        fn update_notice(&self, target: &NoticeRef, replacement: Notice) -> RepoResult<Notice> {
            self.notices.update_notice(target, replacement)
        }
        fn delete_notice(&self, target: &NoticeRef) -> RepoResult<Notice> {
            self.notices.delete_notice(target)
        }
    }

    pub struct HtmlSlideRepo {
        path: PathBuf,
        media_href: String,
    }

    impl HtmlSlideRepo {
        pub fn new(path: impl Into<PathBuf>, media_href: impl Into<String>) -> Self {
            Self { path: path.into(), media_href: media_href.into() }
        }
    }

    impl SlideRepo for HtmlSlideRepo {
        fn load_slides(&self) -> RepoResult<Vec<Slide>> {
            Ok(read_optional(&self.path)?
                .map(|html| parse_slides(&html, &self.media_href))
                .unwrap_or_default())
        }

        fn save_slides(&self, slides: &[Slide]) -> RepoResult<()> {
            write_file(&self.path, render_banner(slides, &self.media_href).as_bytes())?;
            info!("wrote {} slide(s) to '{}'", slides.len(), self.path.display());
            Ok(())
        }
    }

    pub struct HtmlNoticeRepo {
        path: PathBuf,
    }

    impl HtmlNoticeRepo {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// Loads the document, bootstrapping or repairing it on disk first if needed.
        pub fn load(&self) -> RepoResult<NoticeDocument> {
            let Some(html) = read_optional(&self.path)? else {
                let doc = NoticeDocument::default();
                self.save(&doc)?;
                info!("created notice document '{}'", self.path.display());
                return Ok(doc);
            };
            let doc = parse_notice_document(&html);
            if doc.needs_rewrite() {
                self.save(&doc)?;
                info!("repaired notice document '{}'", self.path.display());
            }
            Ok(doc)
        }

        fn save(&self, doc: &NoticeDocument) -> RepoResult<()> {
            write_file(&self.path, render_notice_document(&doc.shell, &doc.notices).as_bytes())
        }
    }

    impl NoticeRepo for HtmlNoticeRepo {
        fn list_notices(&self) -> RepoResult<Vec<Notice>> {
            Ok(self.load()?.notices)
        }

        fn insert_notice(&self, notice: Notice) -> RepoResult<Notice> {
            let mut doc = self.load()?;
            if doc.notices.iter().any(|n| n.id == notice.id) {
                return Err(RepoError::Conflict);
            }
            doc.notices.insert(0, notice.clone());
            self.save(&doc)?;
            Ok(notice)
        }

        fn update_notice(&self, target: &NoticeRef, replacement: Notice) -> RepoResult<Notice> {
            let mut doc = self.load()?;
            let at = position_of(&doc.notices, target)?;
            let previous = std::mem::replace(&mut doc.notices[at], replacement);
            self.save(&doc)?;
            Ok(previous)
        }

        fn delete_notice(&self, target: &NoticeRef) -> RepoResult<Notice> {
            let mut doc = self.load()?;
            let at = position_of(&doc.notices, target)?;
            let removed = doc.notices.remove(at);
            self.save(&doc)?;
            Ok(removed)
        }
    }
}

/// A JSON state file is the store of record; HTML is re-rendered after every mutation.
pub mod snapshot {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
    use tracing::info;

    use crate::parse::{parse_notice_document, parse_slides};
    use crate::render::{render_banner, render_notice_document, DocumentShell};

    pub const STATE_FILE: &str = "state.json";

    #[derive(Clone, Default, Serialize, Deserialize)]
    struct State {
        #[serde(default)]
        slides: Vec<Slide>,
        #[serde(default)]
        notices: Vec<Notice>,
        #[serde(default)]
        saved_at: Option<DateTime<Utc>>,
    }

    /// Where rendered HTML goes after each mutation.
    #[derive(Debug, Clone)]
    pub struct PublishTargets {
        pub banner_html: PathBuf,
        pub media_href: String,
        pub notice_html: PathBuf,
    }

    #[derive(Clone, Copy)]
    enum Touched {
        Slides,
        Notices,
    }

    #[derive(Clone)]
    pub struct SnapshotRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Arc<PathBuf>,
        targets: Arc<PublishTargets>,
    }

    impl SnapshotRepo {
        /// Opens `data_dir/state.json`. Without one, the published HTML files are
        /// imported so switching backends keeps existing content.
        pub fn open(data_dir: &Path, targets: PublishTargets) -> RepoResult<Self> {
            let snapshot_path = data_dir.join(STATE_FILE);
            let state = match read_optional(&snapshot_path)? {
                Some(raw) => {
                    let state: State = serde_json::from_str(&raw)?;
                    info!("loaded snapshot '{}'", snapshot_path.display());
                    state
                }
                None => Self::import(&targets)?,
            };
            Ok(Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Arc::new(snapshot_path),
                targets: Arc::new(targets),
            })
        }

        pub fn snapshot_path(&self) -> &Path {
            &self.snapshot_path
        }

        fn import(targets: &PublishTargets) -> RepoResult<State> {
            let slides = read_optional(&targets.banner_html)?
                .map(|html| parse_slides(&html, &targets.media_href))
                .unwrap_or_default();
            let notices = read_optional(&targets.notice_html)?
                .map(|html| parse_notice_document(&html).notices)
                .unwrap_or_default();
            info!(
                "no snapshot yet; imported {} slide(s) and {} notice(s) from HTML",
                slides.len(),
                notices.len()
            );
            Ok(State { slides, notices, saved_at: None })
        }

        fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        /// Applies `change` to a copy of the state and swaps it in only once the
        /// copy is on disk, so a failed write leaves memory as it was.
        fn commit<T>(
            &self,
            touched: Touched,
            change: impl FnOnce(&mut State) -> RepoResult<T>,
        ) -> RepoResult<T> {
            let mut current = self.write()?;
            let mut next = current.clone();
            let out = change(&mut next)?;
            next.saved_at = Some(Utc::now());
            self.persist(&next, touched)?;
            *current = next;
            Ok(out)
        }

        fn persist(&self, s: &State, touched: Touched) -> RepoResult<()> {
            write_file(&self.snapshot_path, &serde_json::to_vec_pretty(s)?)?;

            match touched {
                Touched::Slides => {
                    let t = &self.targets;
                    write_file(&t.banner_html, render_banner(&s.slides, &t.media_href).as_bytes())?;
                }
                Touched::Notices => {
                    // keep whatever surrounds the table in the published page
                    let shell = read_optional(&self.targets.notice_html)?
                        .map(|html| parse_notice_document(&html).shell)
                        .unwrap_or_else(DocumentShell::default);
                    let html = render_notice_document(&shell, &s.notices);
                    write_file(&self.targets.notice_html, html.as_bytes())?;
                }
            }
            Ok(())
        }
    }

    impl SlideRepo for SnapshotRepo {
        fn load_slides(&self) -> RepoResult<Vec<Slide>> {
            Ok(self.read()?.slides.clone())
        }

        fn save_slides(&self, slides: &[Slide]) -> RepoResult<()> {
            self.commit(Touched::Slides, |s| {
                s.slides = slides.to_vec();
                Ok(())
            })
        }
    }

    impl NoticeRepo for SnapshotRepo {
        fn list_notices(&self) -> RepoResult<Vec<Notice>> {
            Ok(self.read()?.notices.clone())
        }

        fn insert_notice(&self, notice: Notice) -> RepoResult<Notice> {
            self.commit(Touched::Notices, |s| {
                if s.notices.iter().any(|n| n.id == notice.id) {
                    return Err(RepoError::Conflict);
                }
                s.notices.insert(0, notice.clone());
                Ok(notice)
            })
        }

        fn update_notice(&self, target: &NoticeRef, replacement: Notice) -> RepoResult<Notice> {
            self.commit(Touched::Notices, |s| {
                let at = position_of(&s.notices, target)?;
                Ok(std::mem::replace(&mut s.notices[at], replacement))
            })
        }

        fn delete_notice(&self, target: &NoticeRef) -> RepoResult<Notice> {
            self.commit(Touched::Notices, |s| {
                let at = position_of(&s.notices, target)?;
                Ok(s.notices.remove(at))
            })
        }
    }
}
