use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum IssueError {
    #[error("{0}")]
    Rejected(String),
    #[error("An error occurred while sending the OTP. Please try again.")]
    UnexpectedError(#[source] anyhow::Error),
}

impl std::fmt::Debug for IssueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum VerifyError {
    #[error("{0}")]
    Rejected(String),
    #[error("An error occurred while verifying the OTP. Please try again.")]
    UnexpectedError(#[source] anyhow::Error),
}

impl std::fmt::Debug for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum CommitError {
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    DatabaseError(String, #[source] anyhow::Error),
    #[error("Failed to deliver the lead.")]
    UnexpectedError(#[source] anyhow::Error),
}

impl std::fmt::Debug for CommitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
