use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("failed to initialize OCR engine: {0}")]
    InitFailed(String),

    #[error("engine handle is not initialized")]
    NotInitialized,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("pixel conversion error: {0}")]
    Marshal(String),

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("none of {pages} page(s) could be recognized")]
    NoPagesRecognized {
        pages: usize,
        #[source]
        last: Option<Box<OcrError>>,
    },

    #[error("renderer error: {0}")]
    Renderer(String),

    #[error("image error: {0}")]
    Imaging(#[from] scribe_imaging::ImagingError),
}

pub type Result<T> = std::result::Result<T, OcrError>;
