use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::repo::Repo;
use crate::storage::{MediaStore, MediaStoreError, NamePolicy};

/// What an edit does with the notice's attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentChange {
    Keep,
    Replace(PathBuf),
    Remove,
}

/// Attachment of a notice as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentInfo {
    pub link: String,
    pub path: PathBuf,
    pub exists: bool,
}

pub struct NoticeBoard {
    repo: Arc<dyn Repo>,
    uploads: Box<dyn MediaStore>,
    site_root: PathBuf,
    link_prefix: String,
}

impl NoticeBoard {
    /// `link_prefix` is the upload directory as written into links, e.g. `notices`.
    pub fn new(
        repo: Arc<dyn Repo>,
        uploads: Box<dyn MediaStore>,
        site_root: impl Into<PathBuf>,
        link_prefix: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            uploads,
            site_root: site_root.into(),
            link_prefix: link_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn submit(&self, input: &NoticeInput, attachment: Option<&Path>) -> AppResult<Notice> {
        let fields = input.validate()?;
        let file_link = attachment.map(|p| self.store_attachment(p)).transpose()?;
        let notice = Notice::create(fields, file_link);

        if let Err(e) = self.repo.insert_notice(notice.clone()) {
            if let Some(link) = &notice.file_link {
                self.discard_attachment(link);
            }
            return Err(e.into());
        }
        info!("added notice {} [{}]", notice.key(), notice.badge);
        Ok(notice)
    }

    /// Rewrites the whole record addressed by `target`. A replaced or removed
    /// attachment is deleted from disk.
    pub fn edit(
        &self,
        target: &NoticeRef,
        input: &NoticeInput,
        change: AttachmentChange,
    ) -> AppResult<Notice> {
        let fields = input.validate()?;
        let current = self.find(target)?;

        let file_link = match change {
            AttachmentChange::Keep => current.file_link.clone(),
            AttachmentChange::Replace(source) => Some(self.store_attachment(&source)?),
            AttachmentChange::Remove => None,
        };
        let replacement = current.revise(fields, file_link);

        let previous = match self.repo.update_notice(&NoticeRef::Id(current.id), replacement.clone()) {
            Ok(previous) => previous,
            Err(e) => {
                if replacement.file_link != current.file_link {
                    if let Some(link) = &replacement.file_link {
                        self.discard_attachment(link);
                    }
                }
                return Err(e.into());
            }
        };
        if previous.file_link != replacement.file_link {
            if let Some(old) = &previous.file_link {
                self.discard_attachment(old);
            }
        }
        info!("updated notice {} -> {}", previous.key(), replacement.key());
        Ok(replacement)
    }

    /// Removes the record and, if it had one, its attachment file.
    pub fn remove(&self, target: &NoticeRef) -> AppResult<Notice> {
        let removed = self.repo.delete_notice(target)?;
        if let Some(link) = &removed.file_link {
            self.discard_attachment(link);
        }
        info!("deleted notice {}", removed.key());
        Ok(removed)
    }

    pub fn find(&self, target: &NoticeRef) -> AppResult<Notice> {
        self.repo
            .list_notices()?
            .into_iter()
            .find(|n| n.is(target))
            .ok_or(AppError::NotFound)
    }

    /// All matches in stored order.
    pub fn search(&self, field: SearchField, term: &str) -> AppResult<Vec<Notice>> {
        Ok(self
            .repo
            .list_notices()?
            .into_iter()
            .filter(|n| n.matches(field, term))
            .collect())
    }

    /// Every notice, newest date first (plain string comparison on `YYYY/MM/DD`).
    pub fn list(&self) -> AppResult<Vec<NoticeView>> {
        let mut notices = self.repo.list_notices()?;
        notices.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(notices.into_iter().map(|n| self.view(n)).collect())
    }

    pub fn attachment(&self, target: &NoticeRef) -> AppResult<Option<AttachmentInfo>> {
        let notice = self.find(target)?;
        Ok(notice.file_link.map(|link| {
            let path = self.resolve_link(&link);
            let exists = path.is_file();
            AttachmentInfo { link, path, exists }
        }))
    }

    pub fn resolve_link(&self, link: &str) -> PathBuf {
        let path = Path::new(link);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.site_root.join(path)
        }
    }

    pub fn view(&self, notice: Notice) -> NoticeView {
        let file_exists = notice
            .file_link
            .as_deref()
            .map(|link| self.resolve_link(link).is_file())
            .unwrap_or(false);
        NoticeView {
            has_file: notice.file_link.is_some(),
            file_name: notice.file_name().map(str::to_string),
            file_exists,
            notice,
        }
    }

    fn store_attachment(&self, source: &Path) -> AppResult<String> {
        let name = self.uploads.import(source, NamePolicy::UniqueSuffix)?;
        Ok(if self.link_prefix.is_empty() {
            name
        } else {
            format!("{}/{}", self.link_prefix, name)
        })
    }

    /// Upload-directory file name behind `link`, if the link points there.
    fn stored_name<'a>(&self, link: &'a str) -> Option<&'a str> {
        let link = link.strip_prefix("./").unwrap_or(link);
        if self.link_prefix.is_empty() {
            Some(link)
        } else {
            link.strip_prefix(self.link_prefix.as_str())?.strip_prefix('/')
        }
    }

    /// Attachment removal never fails the operation that triggered it. Only
    /// files inside the upload directory are deleted.
    fn discard_attachment(&self, link: &str) {
        let outside = || warn!("attachment '{link}' is outside the upload directory; left in place");
        let Some(name) = self.stored_name(link) else {
            return outside();
        };
        match self.uploads.remove(name) {
            Ok(true) => {}
            Ok(false) => info!("attachment '{link}' was already gone"),
            Err(MediaStoreError::BadName(_)) => outside(),
            Err(e) => warn!("could not delete attachment: {e}"),
        }
    }
}
