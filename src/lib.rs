pub mod banner;
pub mod config;
pub mod error;
pub mod models;
pub mod notices;
pub mod parse; // DOM readers for both file formats
pub mod render;
pub mod repo;
pub mod site;
pub mod storage;

// Re-export commonly used items for tests / external users
pub use banner::{BannerEditor, SlideDeck};
pub use config::{Backend, Settings};
pub use error::{AppError, AppResult};
pub use notices::{AttachmentChange, NoticeBoard};
pub use site::Site;
