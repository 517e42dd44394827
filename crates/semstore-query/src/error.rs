//! Errors raised while constructing descriptions.
//!
//! Only programmer errors are reported this way. Data-level problems
//! (unknown concepts, unsupported comparisons, cycles) are handled by the
//! compiler's error log instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptionError {
    #[error("class description requires at least one class")]
    EmptyClassSet,

    #[error("class description requires class entities, got `{0}`")]
    NotAClass(String),
}

pub type Result<T> = std::result::Result<T, DescriptionError>;
