use crate::config::Config;
use crate::errors::{FerryError, Result};
use crate::git::GitOps;

/// Per-run bookkeeping. Created when a migration starts, discarded with the
/// migrator; the repository itself holds all durable state.
#[derive(Debug, Default)]
struct WorkflowState {
    original_branch: String,
    stash_created: bool,
    reapply_pending: bool,
}

/// Drives the migration: stash the working set, commit it on the upstream
/// branch, push, then return and rebase. Once the stash exists it is the
/// durable record of the user's changes and survives every failure path;
/// it is only dropped after push and rebase have both been confirmed.
pub struct Migrator<G: GitOps> {
    git: G,
    config: Config,
    state: WorkflowState,
}

impl<G: GitOps> Migrator<G> {
    pub fn new(git: G, config: Config) -> Result<Self> {
        let original_branch = git.current_branch()?;
        if original_branch == config.upstream {
            return Err(FerryError::AlreadyOnUpstream(original_branch));
        }
        Ok(Self {
            git,
            config,
            state: WorkflowState {
                original_branch,
                ..Default::default()
            },
        })
    }

    /// Run the three phases in order, reminding the user how to recover
    /// their stash if anything fails after it was created.
    pub fn run(&mut self) -> Result<()> {
        let outcome = self
            .capture_and_apply()
            .and_then(|_| self.finalize())
            .and_then(|_| self.return_and_rebase());
        if outcome.is_err() && self.state.stash_created {
            log::warn!("your original changes are still stashed; recover them with 'git stash apply'");
        }
        outcome
    }

    /// Stash the working set, switch to the upstream branch and re-apply the
    /// stash there.
    pub fn capture_and_apply(&mut self) -> Result<()> {
        self.git.stash()?;
        self.state.stash_created = true;
        println!("stashed working set from '{}'", self.state.original_branch);

        // A failed switch leaves the stash untouched: dropping it here would
        // lose the only copy of the user's changes.
        self.git.switch_branch(&self.config.upstream)?;

        // On conflict the upstream working tree is left as-is, so the user
        // can resolve it in place. The stash entry survives.
        self.git.apply_stash()?;
        Ok(())
    }

    /// Commit the selected paths on the upstream branch and push them.
    pub fn finalize(&mut self) -> Result<()> {
        let author = self.config.author_string()?;

        if self.config.pull_first {
            if let Some(remote) = &self.config.remote {
                self.git.pull(remote)?;
            }
        }

        if !self.config.files.is_empty() {
            self.state.reapply_pending = true;
        }
        let message = self
            .config
            .message
            .clone()
            .unwrap_or_else(|| format!("Apply working set from '{}'", self.state.original_branch));
        self.git.stage_and_commit(&self.config.files, &author, &message)?;
        println!("committed working set on '{}'", self.config.upstream);

        if let Some(remote) = &self.config.remote {
            self.git.push(remote)?;
            println!("pushed '{}' to '{}'", self.config.upstream, remote);
        }

        if self.state.reapply_pending {
            self.backout_unselected()?;
        }
        Ok(())
    }

    /// Return to the original branch, rebase it onto the upstream branch and
    /// drop the stash.
    pub fn return_and_rebase(&mut self) -> Result<()> {
        // The one transition without a rollback path: on failure the user is
        // left on the upstream branch and the error is reported as-is.
        self.git.switch_branch(&self.state.original_branch)?;

        if self.config.skip_rebase {
            log::warn!("--norebase set, skipping rebase");
        } else {
            self.git.rebase(&self.config.upstream)?;
            println!(
                "rebased '{}' onto '{}'",
                self.state.original_branch, self.config.upstream
            );
        }

        if self.state.reapply_pending {
            // Bring the unselected changes back as uncommitted edits before
            // the stash goes away.
            self.git.apply_stash()?;
        }

        if self.config.keep_stash {
            log::warn!("--noclear set, keeping stash");
            return Ok(());
        }
        self.git.drop_stash()?;
        self.state.stash_created = false;
        Ok(())
    }

    /// Clear everything the commit did not pick up from the upstream working
    /// tree, leaving only the committed subset behind. The stash entry is
    /// untouched.
    fn backout_unselected(&mut self) -> Result<()> {
        self.git.reset_index()?;
        self.git.discard_working_changes()?;
        Ok(())
    }
}
