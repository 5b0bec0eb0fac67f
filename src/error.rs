use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV Error: {0}")]
    OpenCvError(#[from] opencv::Error),

    #[error("expected 8 keypoint coordinates, got {0}")]
    InvalidKeypoints(usize),

    #[error("unknown camera: {0}")]
    UnknownCamera(String),

    #[error("number of frames ({got}) must match the number of registered views ({expected})")]
    ViewCountMismatch { expected: usize, got: usize },

    #[error("invalid config: {0}")]
    Config(String),
}
