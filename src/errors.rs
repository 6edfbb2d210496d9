use thiserror::Error;

/// Exit codes surfaced to calling scripts, one per failure category.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const BRANCH: i32 = 1;
    pub const STASH: i32 = 2;
    pub const COMMIT: i32 = 3;
    pub const REMOTE: i32 = 4;
    pub const CONFLICT: i32 = 5;
}

#[derive(Error, Debug)]
pub enum FerryError {
    #[error("branch '{0}' not found")]
    BranchNotFound(String),

    #[error("uncommitted changes block checking out '{0}'")]
    DirtyCheckoutBlocked(String),

    #[error("no local changes to save")]
    NoChangesToStash,

    #[error("stash did not apply cleanly: {0}")]
    ApplyConflict(String),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("commit rejected: {0}")]
    CommitRejected(String),

    #[error("no committer identity; pass --user/--email or set user.name and user.email in git config")]
    IdentityMissing,

    #[error("push rejected: {0}")]
    PushRejected(String),

    #[error("pull failed: {0}")]
    PullConflict(String),

    #[error("rebase stopped: {0}")]
    RebaseConflict(String),

    #[error("no stash entry to drop")]
    NoStashToDrop,

    #[error("no git repository found at '{0}' or any parent directory")]
    RepositoryNotFound(String),

    #[error("remote '{0}' not found; use --remote none to skip pushing")]
    RemoteNotFound(String),

    #[error("already on upstream branch '{0}'; nothing to migrate")]
    AlreadyOnUpstream(String),

    #[error("git operation failed: {0}")]
    Git(String),
}

pub type Result<T> = std::result::Result<T, FerryError>;

impl From<git2::Error> for FerryError {
    fn from(e: git2::Error) -> Self {
        FerryError::Git(e.message().to_string())
    }
}

impl FerryError {
    /// Map the failure to its category exit code.
    pub fn exit_code(&self) -> i32 {
        use FerryError::*;

        match self {
            BranchNotFound(_) | DirtyCheckoutBlocked(_) | RepositoryNotFound(_)
            | AlreadyOnUpstream(_) | Git(_) => exit_code::BRANCH,
            NoChangesToStash | NoStashToDrop => exit_code::STASH,
            NothingToCommit | CommitRejected(_) | IdentityMissing => exit_code::COMMIT,
            PushRejected(_) | PullConflict(_) | RemoteNotFound(_) => exit_code::REMOTE,
            ApplyConflict(_) | RebaseConflict(_) => exit_code::CONFLICT,
        }
    }
}
