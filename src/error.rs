use crate::models::ValidationError;
use crate::repo::RepoError;
use crate::storage::MediaStoreError;

/// Failure of one banner or notice operation, as reported to the user.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// `position` is 1-based, as shown to the user.
    #[error("no slide at position {position} (there are {len})")]
    OutOfRange { position: usize, len: usize },
    #[error("there are no slides")]
    NoSlides,
    #[error("cancelled")]
    Declined,
    #[error(transparent)]
    Media(#[from] MediaStoreError),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => AppError::NotFound,
            RepoError::Conflict => AppError::Conflict,
            other => AppError::Repo(other),
        }
    }
}

impl AppError {
    /// 1 for anything the user can fix by changing the input, 2 for I/O and storage failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotFound
            | AppError::Conflict
            | AppError::Invalid(_)
            | AppError::OutOfRange { .. }
            | AppError::NoSlides
            | AppError::Declined
            | AppError::Media(MediaStoreError::NotFound(_) | MediaStoreError::BadName(_)) => 1,
            AppError::Media(_) | AppError::Repo(_) => 2,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
