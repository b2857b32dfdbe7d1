use thiserror::Error;

use crate::document::DocumentError;
use crate::input::UploadError;
use crate::settings::{SettingsError, StoreError};

/// How a failure is surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input; alert, no state change.
    InvalidInput,
    /// Alert and log; nothing partial is kept.
    DocumentLoad,
    /// Log only.
    Storage,
    /// Ignored.
    Audio,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("could not load the PDF, please check the file: {0}")]
    DocumentLoad(#[from] DocumentError),
    #[error("settings were not saved: {0}")]
    Storage(#[from] StoreError),
    #[error("sound cue failed: {0}")]
    Audio(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Upload(_) | AppError::Settings(_) => ErrorKind::InvalidInput,
            AppError::DocumentLoad(_) => ErrorKind::DocumentLoad,
            AppError::Storage(_) => ErrorKind::Storage,
            AppError::Audio(_) => ErrorKind::Audio,
        }
    }

    /// Whether the user sees an alert for this error.
    pub fn alerts_user(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidInput | ErrorKind::DocumentLoad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_decide_alerting() {
        let upload: AppError = UploadError::TooLarge { size: 5 }.into();
        assert_eq!(upload.kind(), ErrorKind::InvalidInput);
        assert!(upload.alerts_user());

        let doc: AppError = DocumentError::NoPages.into();
        assert!(doc.alerts_user());

        let store: AppError = StoreError::Unavailable.into();
        assert_eq!(store.kind(), ErrorKind::Storage);
        assert!(!store.alerts_user());
        assert!(!AppError::Audio("muted".into()).alerts_user());
    }
}
