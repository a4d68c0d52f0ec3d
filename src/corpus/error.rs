use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Payload {filename} does not exist for {technology}")]
    NotFound {
        technology: &'static str,
        filename: String,
    },

    #[error("Failed to read payload: {0}")]
    Stream(#[from] std::io::Error),
}
