use std::sync::Arc;

use tracing::info;

use crate::banner::BannerEditor;
use crate::config::{Backend, Settings};
use crate::error::AppResult;
use crate::notices::NoticeBoard;
use crate::repo::html::{HtmlNoticeRepo, HtmlRepo, HtmlSlideRepo};
use crate::repo::snapshot::{PublishTargets, SnapshotRepo};
use crate::repo::Repo;
use crate::storage::FsMediaStore;

/// Settings plus the repository they select; hands out the two editors.
#[derive(Clone)]
pub struct Site {
    pub settings: Settings,
    pub repo: Arc<dyn Repo>,
}

impl Site {
    pub fn open(settings: Settings) -> AppResult<Self> {
        let repo: Arc<dyn Repo> = match settings.backend {
            Backend::Html => {
                info!("using HTML files as the store of record");
                Arc::new(HtmlRepo::new(
                    HtmlSlideRepo::new(settings.banner_html_path(), settings.media_href()),
                    HtmlNoticeRepo::new(settings.notice_html_path()),
                ))
            }
            Backend::Snapshot => {
                let repo = SnapshotRepo::open(
                    &settings.data_dir_path(),
                    PublishTargets {
                        banner_html: settings.banner_html_path(),
                        media_href: settings.media_href(),
                        notice_html: settings.notice_html_path(),
                    },
                )?;
                info!("using snapshot '{}' as the store of record", repo.snapshot_path().display());
                Arc::new(repo)
            }
        };
        Ok(Self { settings, repo })
    }

    pub fn banner(&self) -> AppResult<BannerEditor> {
        BannerEditor::open(
            self.repo.clone(),
            Box::new(FsMediaStore::new(self.settings.media_dir_path())),
        )
    }

    pub fn notices(&self) -> NoticeBoard {
        NoticeBoard::new(
            self.repo.clone(),
            Box::new(FsMediaStore::new(self.settings.upload_dir_path())),
            self.settings.root.clone(),
            self.settings.upload_link_prefix(),
        )
    }
}
