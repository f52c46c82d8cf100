/// Coarse grouping used by callers that only care about the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    Expired,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidState => "invalid_state",
            Self::Expired => "expired",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum AttemptError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("An attempt for this quiz is already in progress")]
    AlreadyActive,
    #[error("Attempt has already been submitted")]
    AlreadyFinalized,
    #[error("Attempt is not in progress")]
    NotInProgress,
    #[error("Attempt is still in progress")]
    StillInProgress,
    #[error("Quiz is not open for attempts")]
    QuizNotActive,
    #[error("Attempt time has expired")]
    Expired,
    #[error("Question index {index} is out of range for {count} questions")]
    InvalidIndex { index: i64, count: i64 },
    #[error("Option does not belong to this question")]
    InvalidOption,
    #[error("{0}")]
    InvalidAnswer(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AttemptError {
    pub(crate) fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyActive | Self::AlreadyFinalized => ErrorKind::Conflict,
            Self::NotInProgress | Self::StillInProgress | Self::QuizNotActive => {
                ErrorKind::InvalidState
            }
            Self::Expired => ErrorKind::Expired,
            Self::InvalidIndex { .. } | Self::InvalidOption | Self::InvalidAnswer(_) => {
                ErrorKind::InvalidInput
            }
            Self::Storage(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(AttemptError::NotFound("Attempt").kind(), ErrorKind::NotFound);
        assert_eq!(AttemptError::AlreadyActive.kind(), ErrorKind::Conflict);
        assert_eq!(AttemptError::AlreadyFinalized.kind(), ErrorKind::Conflict);
        assert_eq!(AttemptError::NotInProgress.kind(), ErrorKind::InvalidState);
        assert_eq!(AttemptError::StillInProgress.kind(), ErrorKind::InvalidState);
        assert_eq!(AttemptError::QuizNotActive.kind(), ErrorKind::InvalidState);
        assert_eq!(AttemptError::Expired.kind(), ErrorKind::Expired);
        assert_eq!(AttemptError::InvalidIndex { index: 3, count: 2 }.kind(), ErrorKind::InvalidInput);
        assert_eq!(AttemptError::InvalidOption.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            AttemptError::Storage(anyhow::anyhow!("db down")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn messages_are_readable() {
        assert_eq!(AttemptError::NotFound("Attempt").to_string(), "Attempt not found");
        assert_eq!(
            AttemptError::InvalidIndex { index: -1, count: 4 }.to_string(),
            "Question index -1 is out of range for 4 questions"
        );
    }
}
