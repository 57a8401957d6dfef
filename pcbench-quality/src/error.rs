use thiserror::Error;

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("Original cloud is empty")]
    EmptyOriginal,

    #[error("Decoded cloud is empty")]
    EmptyDecoded,

    #[error("Non-finite coordinate at point {index} of the {cloud} cloud")]
    NonFinite { cloud: &'static str, index: usize },
}
