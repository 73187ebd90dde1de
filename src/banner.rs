//! Banner slide editing: an ordered deck with a selection cursor.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{Slide, SlideKind, DEFAULT_CAPTION};
use crate::repo::Repo;
use crate::storage::{MediaStore, MediaStoreError, NamePolicy};

/// In-memory slide list. List order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideDeck {
    slides: Vec<Slide>,
    current: usize,
}

impl SlideDeck {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self { slides, current: 0 }
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Slide> {
        self.slides.get(self.current)
    }

    pub fn select(&mut self, index: usize) -> AppResult<&Slide> {
        if index >= self.slides.len() {
            return Err(AppError::OutOfRange {
                position: index.saturating_add(1),
                len: self.slides.len(),
            });
        }
        self.current = index;
        Ok(&self.slides[index])
    }

    /// Swaps the current slide with the one before it. No-op on the first slide.
    pub fn move_up(&mut self) -> bool {
        if self.current == 0 || self.current >= self.slides.len() {
            return false;
        }
        self.slides.swap(self.current, self.current - 1);
        self.current -= 1;
        true
    }

    /// Swaps the current slide with the one after it. No-op on the last slide.
    pub fn move_down(&mut self) -> bool {
        if self.current + 1 >= self.slides.len() {
            return false;
        }
        self.slides.swap(self.current, self.current + 1);
        self.current += 1;
        true
    }

    /// Appends a slide and selects it.
    pub fn push(&mut self, slide: Slide) -> &Slide {
        self.slides.push(slide);
        self.current = self.slides.len() - 1;
        &self.slides[self.current]
    }

    pub fn set_caption(&mut self, caption: &str) -> AppResult<&Slide> {
        let slide = self.slides.get_mut(self.current).ok_or(AppError::NoSlides)?;
        slide.caption = caption.trim().to_string();
        Ok(&*slide)
    }

    /// Removes the current slide and clamps the cursor back into range.
    pub fn remove_current(&mut self) -> Option<Slide> {
        if self.current >= self.slides.len() {
            return None;
        }
        let removed = self.slides.remove(self.current);
        self.current = self.current.min(self.slides.len().saturating_sub(1));
        Some(removed)
    }
}

/// Deck bound to its repository and media directory.
pub struct BannerEditor {
    repo: Arc<dyn Repo>,
    media: Box<dyn MediaStore>,
    deck: SlideDeck,
}

impl BannerEditor {
    pub fn open(repo: Arc<dyn Repo>, media: Box<dyn MediaStore>) -> AppResult<Self> {
        let deck = SlideDeck::new(repo.load_slides()?);
        Ok(Self { repo, media, deck })
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut SlideDeck {
        &mut self.deck
    }

    pub fn media_path(&self, slide: &Slide) -> PathBuf {
        self.media.path_of(&slide.file)
    }

    pub fn media_exists(&self, slide: &Slide) -> bool {
        self.media.exists(&slide.file)
    }

    /// Copies `source` into the media directory (unless a file of that name is
    /// already there) and appends a slide for it.
    pub fn add_slide(&mut self, source: &Path, caption: Option<&str>) -> AppResult<&Slide> {
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let kind = SlideKind::for_file(name)?;
        let file = self.media.import(source, NamePolicy::KeepName)?;
        let caption = caption
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CAPTION)
            .to_string();
        info!("added {kind} slide '{file}'");
        Ok(self.deck.push(Slide { kind, file, caption }))
    }

    /// Deletes the current slide and its media file. If the file cannot be
    /// removed the deck is left untouched. A file name that points outside
    /// the media directory is never deleted; the slide still goes.
    pub fn delete_current(&mut self) -> AppResult<Slide> {
        let slide = self.deck.current().ok_or(AppError::NoSlides)?;
        match self.media.remove(&slide.file) {
            Ok(true) => {}
            Ok(false) => info!("media file '{}' was already gone", slide.file),
            Err(MediaStoreError::BadName(_)) => {
                warn!("'{}' is not a file in the media directory; left in place", slide.file)
            }
            Err(e) => return Err(e.into()),
        }
        let removed = self.deck.remove_current().ok_or(AppError::NoSlides)?;
        info!("deleted slide '{}'", removed.file);
        Ok(removed)
    }

    pub fn save(&self) -> AppResult<()> {
        self.repo.save_slides(self.deck.slides())?;
        Ok(())
    }
}
