//! Keyboard shortcuts and upload checks.

use thiserror::Error;

pub const PDF_MIME: &str = "application/pdf";
/// Largest accepted avatar image.
pub const MAX_AVATAR_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    PrevPage,
    NextPage,
    ZoomIn,
    ZoomOut,
    ToggleFocus,
}

impl Shortcut {
    /// Map a `KeyboardEvent.key` value.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Shortcut::PrevPage),
            "ArrowRight" => Some(Shortcut::NextPage),
            "+" | "=" => Some(Shortcut::ZoomIn),
            "-" => Some(Shortcut::ZoomOut),
            " " => Some(Shortcut::ToggleFocus),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("please choose a valid PDF file")]
    NotPdf { mime: String },
    #[error("please choose an image file")]
    NotImage { mime: String },
    #[error("images must be 2 MB or smaller")]
    TooLarge { size: u64 },
}

pub fn check_document(mime: &str) -> Result<(), UploadError> {
    if mime != PDF_MIME {
        return Err(UploadError::NotPdf {
            mime: mime.to_string(),
        });
    }
    Ok(())
}

pub fn check_avatar(mime: &str, size: u64) -> Result<(), UploadError> {
    if !mime.starts_with("image/") {
        return Err(UploadError::NotImage {
            mime: mime.to_string(),
        });
    }
    if size > MAX_AVATAR_BYTES {
        return Err(UploadError::TooLarge { size });
    }
    Ok(())
}
