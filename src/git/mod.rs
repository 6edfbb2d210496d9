//! Gateway to the underlying version-control system.
//!
//! The migration state machine only ever talks to [`GitOps`]; the concrete
//! [`GitRepository`] binds it to libgit2 while the tests substitute a
//! scripted mock.

#[cfg(test)]
pub mod mock;
mod repository;

pub use repository::GitRepository;

use crate::errors::Result;

/// Operations the migration workflow needs from the repository.
///
/// Every call either succeeds or fails with a specific `FerryError` kind;
/// nothing is retried and no repository state is cached between calls.
pub trait GitOps {
    /// Name of the branch HEAD currently points at.
    fn current_branch(&self) -> Result<String>;

    /// Save all uncommitted changes to the stash. A clean working tree is a
    /// hard `NoChangesToStash` failure, not a no-op.
    fn stash(&mut self) -> Result<()>;

    /// Check out the named local branch.
    fn switch_branch(&mut self, name: &str) -> Result<()>;

    /// Re-apply the most recent stash entry without removing it.
    fn apply_stash(&mut self) -> Result<()>;

    /// Remove the most recent stash entry.
    fn drop_stash(&mut self) -> Result<()>;

    /// Stage `paths` (everything under the work tree root when empty) and
    /// commit them with the given author string and message.
    fn stage_and_commit(&mut self, paths: &[String], author: &str, message: &str) -> Result<()>;

    /// Push the current branch to `remote`.
    fn push(&mut self, remote: &str) -> Result<()>;

    /// Fetch from `remote` and fast-forward the current branch.
    fn pull(&mut self, remote: &str) -> Result<()>;

    /// Unstage everything, keeping the working tree as it is.
    fn reset_index(&mut self) -> Result<()>;

    /// Discard unstaged edits with a forced checkout of HEAD.
    fn discard_working_changes(&mut self) -> Result<()>;

    /// Rebase the current branch onto `onto`.
    fn rebase(&mut self, onto: &str) -> Result<()>;
}
