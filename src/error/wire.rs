use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("Request '{id}' has a body that is not valid base64: {source}")]
    InvalidBody {
        id: String,
        #[source]
        source: base64::DecodeError,
    },
}
