use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid image data: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode annotated image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid data URI: {0}")]
    DataUri(String),
}

pub type Result<T> = std::result::Result<T, Error>;
