use super::lexer::ScanError;

/// Everything that can stop a source file from producing its artifacts.
/// None of these are recoverable: a file either generates completely or not at
/// all.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DynaError {
    #[error("line {line}: {source}")]
    Scan { line: usize, source: ScanError },
    #[error("line {line}: '{keyword}' must come after {needs}")]
    MissingContext { line: usize, keyword: String, needs: String },
    #[error("line {line}: malformed '{keyword}' block: {reason}")]
    MalformedHeader { line: usize, keyword: String, reason: String },
    #[error("line {line}: comment block is never closed")]
    Unterminated { line: usize },
    #[error("'{name}' needs a count of {count}, but counts stop at 255")]
    CountOverflow { name: String, count: usize },
    #[error("could not render generated text")]
    Render(#[from] std::fmt::Error),
}

pub type DynaResult<T> = Result<T, DynaError>;
