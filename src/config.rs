use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context};

/// Which repository is the store of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Html,
    Snapshot,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(Backend::Html),
            "snapshot" | "json" => Ok(Backend::Snapshot),
            other => Err(format!("unknown backend {other:?} (html, snapshot)")),
        }
    }
}

/// File layout of the site. Relative paths resolve against `root`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub banner_html: PathBuf,
    pub banner_media_dir: PathBuf,
    pub notice_html: PathBuf,
    pub notice_upload_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            backend: Backend::Html,
            data_dir: PathBuf::from("data"),
            banner_html: PathBuf::from("banner.html"),
            banner_media_dir: PathBuf::from("banner/banner_img"),
            notice_html: PathBuf::from("notice.html"),
            notice_upload_dir: PathBuf::from("notices"),
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        fn path_env(name: &str, default: PathBuf) -> PathBuf {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        }

        let d = Settings::default();
        let backend = match std::env::var("SITEKEEPER_BACKEND") {
            Ok(v) if !v.trim().is_empty() => v
                .parse::<Backend>()
                .map_err(|e: String| anyhow!(e))
                .context("SITEKEEPER_BACKEND")?,
            _ => d.backend,
        };
        Ok(Self {
            root: path_env("SITEKEEPER_ROOT", d.root),
            backend,
            data_dir: path_env("SITEKEEPER_DATA_DIR", d.data_dir),
            banner_html: path_env("BANNER_HTML", d.banner_html),
            banner_media_dir: path_env("BANNER_MEDIA_DIR", d.banner_media_dir),
            notice_html: path_env("NOTICE_HTML", d.notice_html),
            notice_upload_dir: path_env("NOTICE_UPLOAD_DIR", d.notice_upload_dir),
        })
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn data_dir_path(&self) -> PathBuf {
        self.resolve(&self.data_dir)
    }

    pub fn banner_html_path(&self) -> PathBuf {
        self.resolve(&self.banner_html)
    }

    pub fn media_dir_path(&self) -> PathBuf {
        self.resolve(&self.banner_media_dir)
    }

    pub fn notice_html_path(&self) -> PathBuf {
        self.resolve(&self.notice_html)
    }

    pub fn upload_dir_path(&self) -> PathBuf {
        self.resolve(&self.notice_upload_dir)
    }

    /// Media `src` prefix used inside the banner snippet, e.g. `./banner/banner_img/`.
    pub fn media_href(&self) -> String {
        format!("./{}/", web_path(&self.banner_media_dir))
    }

    /// Upload directory as it appears in attachment links, e.g. `notices`.
    /// An absolute upload directory is linked absolutely.
    pub fn upload_link_prefix(&self) -> String {
        if self.notice_upload_dir.is_absolute() {
            return self
                .notice_upload_dir
                .to_string_lossy()
                .trim_end_matches(|c| c == '/' || c == '\\')
                .to_string();
        }
        web_path(&self.notice_upload_dir)
    }
}

fn web_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .trim_start_matches("./")
        .trim_matches('/')
        .to_string()
}
