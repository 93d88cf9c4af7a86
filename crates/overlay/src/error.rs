use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
