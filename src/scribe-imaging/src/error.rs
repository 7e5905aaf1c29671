//! Imaging error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("unrecognized image format")]
    UnknownFormat,

    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ImagingError>;
