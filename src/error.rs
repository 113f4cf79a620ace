use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZramError {
    #[error("{1}: {0}")]
    IO(#[source] io::Error, String),
    #[error("{0}")]
    UnexpectedContent(String),
    #[error("compressed data size is zero, compression ratio is undefined")]
    ZeroCompressedSize,
    #[error("could not serialize statistics: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not write report: {0}")]
    Output(#[from] io::Error),
}
