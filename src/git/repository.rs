use std::path::Path;

use auth_git2::GitAuthenticator;
use git2::build::CheckoutBuilder;
use git2::{
    BranchType, ErrorCode, FetchOptions, IndexAddOption, ObjectType, PushOptions,
    RebaseOptions, RemoteCallbacks, ResetType, Signature, StashApplyOptions, StashFlags,
};

use crate::errors::{FerryError, Result};
use crate::git::GitOps;

/// libgit2-backed gateway. Holds no state of its own beyond the repository
/// handle; every operation reads the repository fresh.
pub struct GitRepository {
    repo: git2::Repository,
}

impl GitRepository {
    /// Open the repository containing `path`, searching parent directories
    /// the way git itself does.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = git2::Repository::discover(path.as_ref())
            .map_err(|_| FerryError::RepositoryNotFound(path.as_ref().display().to_string()))?;
        Ok(Self { repo })
    }

    /// Fail early when the configured remote does not exist.
    pub fn ensure_remote(&self, name: &str) -> Result<()> {
        self.repo
            .find_remote(name)
            .map(|_| ())
            .map_err(|_| FerryError::RemoteNotFound(name.to_string()))
    }

    /// Resolve the committer identity, preferring explicit overrides and
    /// falling back to repository then global configuration.
    pub fn committer_identity(
        &self,
        user: Option<String>,
        email: Option<String>,
    ) -> Result<(Option<String>, Option<String>)> {
        let config = self.repo.config()?;
        let user = user.or_else(|| config.get_string("user.name").ok());
        let email = email.or_else(|| config.get_string("user.email").ok());
        Ok((user, email))
    }

    fn default_signature(&self) -> Result<Signature<'static>> {
        self.repo
            .signature()
            .or_else(|_| Signature::now("ferry", "ferry@localhost"))
            .map_err(FerryError::from)
    }
}

/// Split an author string of the form `Name <email>`; anything else is used
/// verbatim as the name.
fn split_author(author: &str) -> (&str, &str) {
    match (author.find('<'), author.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            (author[..open].trim(), author[open + 1..close].trim())
        }
        _ => (author.trim(), ""),
    }
}

impl GitOps for GitRepository {
    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        head.shorthand()
            .map(str::to_owned)
            .ok_or_else(|| FerryError::Git("HEAD is not a named branch".to_string()))
    }

    fn stash(&mut self) -> Result<()> {
        let signature = self.default_signature()?;
        match self
            .repo
            .stash_save(&signature, "ferry: captured working set", Some(StashFlags::DEFAULT))
        {
            Ok(_) => Ok(()),
            Err(e) if e.code() == ErrorCode::NotFound => Err(FerryError::NoChangesToStash),
            Err(e) => Err(e.into()),
        }
    }

    fn switch_branch(&mut self, name: &str) -> Result<()> {
        let branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|_| FerryError::BranchNotFound(name.to_string()))?;
        let reference = branch.into_reference();
        let refname = reference
            .name()
            .ok_or_else(|| FerryError::Git(format!("branch '{}' has a non-UTF-8 name", name)))?
            .to_string();
        let target = reference.peel(ObjectType::Commit)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(&target, Some(&mut checkout))
            .map_err(|e| {
                if e.code() == ErrorCode::Conflict {
                    FerryError::DirtyCheckoutBlocked(name.to_string())
                } else {
                    e.into()
                }
            })?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    fn apply_stash(&mut self) -> Result<()> {
        let mut options = StashApplyOptions::new();
        match self.repo.stash_apply(0, Some(&mut options)) {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.code(), ErrorCode::Conflict | ErrorCode::MergeConflict) => {
                Err(FerryError::ApplyConflict(e.message().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn drop_stash(&mut self) -> Result<()> {
        match self.repo.stash_drop(0) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == ErrorCode::NotFound => Err(FerryError::NoStashToDrop),
            Err(e) => Err(e.into()),
        }
    }

    fn stage_and_commit(&mut self, paths: &[String], author: &str, message: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        if paths.is_empty() {
            index
                .add_all(["*"], IndexAddOption::DEFAULT, None)
                .map_err(|e| FerryError::CommitRejected(e.message().to_string()))?;
        } else {
            let workdir = self.repo.workdir().map(Path::to_path_buf);
            for raw in paths {
                let path = Path::new(raw);
                let is_dir = workdir
                    .as_ref()
                    .map(|root| root.join(path).is_dir())
                    .unwrap_or(false);
                let added = if is_dir {
                    index.add_all([path], IndexAddOption::DEFAULT, None)
                } else {
                    index.add_path(path)
                };
                added.map_err(|e| FerryError::CommitRejected(e.message().to_string()))?;
            }
        }
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        if let Some(parent) = &parent {
            if parent.tree_id() == tree_id {
                return Err(FerryError::NothingToCommit);
            }
        }

        let tree = self.repo.find_tree(tree_id)?;
        let (name, email) = split_author(author);
        let author_sig = Signature::now(name, email)
            .map_err(|e| FerryError::CommitRejected(e.message().to_string()))?;
        let committer = self
            .repo
            .signature()
            .or_else(|_| Signature::now(name, email))
            .map_err(|e| FerryError::CommitRejected(e.message().to_string()))?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &author_sig, &committer, message, &tree, &parents)
            .map_err(|e| FerryError::CommitRejected(e.message().to_string()))?;
        Ok(())
    }

    fn push(&mut self, remote_name: &str) -> Result<()> {
        let head = self.repo.head()?;
        let refname = head
            .name()
            .ok_or_else(|| FerryError::Git("HEAD name is not valid UTF-8".to_string()))?
            .to_string();

        let auth = GitAuthenticator::default();
        let git_config = self.repo.config()?;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(auth.credentials(&git_config));
        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|_| FerryError::RemoteNotFound(remote_name.to_string()))?;
        let refspec = format!("{}:{}", refname, refname);
        remote
            .push(&[refspec.as_str()], Some(&mut options))
            .map_err(|e| FerryError::PushRejected(e.message().to_string()))?;
        Ok(())
    }

    fn pull(&mut self, remote_name: &str) -> Result<()> {
        let branch = self.current_branch()?;

        let auth = GitAuthenticator::default();
        let git_config = self.repo.config()?;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(auth.credentials(&git_config));
        let mut options = FetchOptions::new();
        options.remote_callbacks(callbacks);

        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|_| FerryError::RemoteNotFound(remote_name.to_string()))?;
        remote
            .fetch(&[branch.as_str()], Some(&mut options), None)
            .map_err(|e| FerryError::PullConflict(e.message().to_string()))?;

        let fetch_head = self.repo.find_reference("FETCH_HEAD")?;
        let fetch_commit = self.repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = self.repo.merge_analysis(&[&fetch_commit])?;
        if analysis.is_up_to_date() {
            return Ok(());
        }
        if !analysis.is_fast_forward() {
            return Err(FerryError::PullConflict(format!(
                "'{}' has diverged from '{}/{}'",
                branch, remote_name, branch
            )));
        }

        let refname = format!("refs/heads/{}", branch);
        let mut reference = self.repo.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), "pull: fast-forward")?;
        self.repo.set_head(&refname)?;
        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_head(Some(&mut checkout))
            .map_err(|e| FerryError::PullConflict(e.message().to_string()))?;
        Ok(())
    }

    fn reset_index(&mut self) -> Result<()> {
        let head = self.repo.head()?.peel(ObjectType::Commit)?;
        self.repo.reset(&head, ResetType::Mixed, None)?;
        Ok(())
    }

    fn discard_working_changes(&mut self) -> Result<()> {
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo.checkout_head(Some(&mut checkout))?;
        Ok(())
    }

    fn rebase(&mut self, onto: &str) -> Result<()> {
        let branch = self
            .repo
            .find_branch(onto, BranchType::Local)
            .map_err(|_| FerryError::BranchNotFound(onto.to_string()))?;
        let upstream = self.repo.reference_to_annotated_commit(branch.get())?;
        let signature = self.default_signature()?;

        let mut options = RebaseOptions::new();
        let mut rebase = self
            .repo
            .rebase(None, Some(&upstream), None, Some(&mut options))?;
        while let Some(operation) = rebase.next() {
            if let Err(e) = operation {
                let _ = rebase.abort();
                return Err(FerryError::RebaseConflict(e.message().to_string()));
            }
            if self.repo.index()?.has_conflicts() {
                // Abort so the branch ref stays where it was; the conflict is
                // for the user to resolve with their own rebase.
                let _ = rebase.abort();
                return Err(FerryError::RebaseConflict(format!(
                    "conflicts while replaying onto '{}'",
                    onto
                )));
            }
            match rebase.commit(None, &signature, None) {
                Ok(_) => {}
                // Patch already present upstream; git skips these too.
                Err(e) if e.code() == ErrorCode::Applied => {}
                Err(e) => {
                    let _ = rebase.abort();
                    return Err(FerryError::RebaseConflict(e.message().to_string()));
                }
            }
        }
        rebase.finish(Some(&signature))?;
        Ok(())
    }
}
