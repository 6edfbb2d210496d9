use std::collections::HashMap;

use crate::errors::{FerryError, Result};
use crate::git::GitOps;

/// Scripted in-memory gateway for exercising the migration state machine.
///
/// Records every call in order and tracks a stash depth so tests can assert
/// both what ran and what was preserved. Failures are scripted per call via
/// [`MockGit::fail_with`]; a scripted failure fires once and is consumed.
#[derive(Default)]
pub struct MockGit {
    pub branch: String,
    pub stash_depth: usize,
    pub calls: Vec<String>,
    pub commits: Vec<(Vec<String>, String, String)>,
    failures: HashMap<String, FerryError>,
}

impl MockGit {
    pub fn on_branch(name: &str) -> Self {
        Self {
            branch: name.to_string(),
            ..Default::default()
        }
    }

    /// Script the call matching `call` (e.g. `"switch:main"`, `"commit"`)
    /// to fail with `error`.
    pub fn fail_with(mut self, call: &str, error: FerryError) -> Self {
        self.failures.insert(call.to_string(), error);
        self
    }

    fn record(&mut self, call: String) -> Result<()> {
        self.calls.push(call.clone());
        match self.failures.remove(&call) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl GitOps for MockGit {
    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn stash(&mut self) -> Result<()> {
        self.record("stash".to_string())?;
        self.stash_depth += 1;
        Ok(())
    }

    fn switch_branch(&mut self, name: &str) -> Result<()> {
        self.record(format!("switch:{}", name))?;
        self.branch = name.to_string();
        Ok(())
    }

    fn apply_stash(&mut self) -> Result<()> {
        self.record("apply".to_string())
    }

    fn drop_stash(&mut self) -> Result<()> {
        self.record("drop".to_string())?;
        if self.stash_depth == 0 {
            return Err(FerryError::NoStashToDrop);
        }
        self.stash_depth -= 1;
        Ok(())
    }

    fn stage_and_commit(&mut self, paths: &[String], author: &str, message: &str) -> Result<()> {
        self.record("commit".to_string())?;
        self.commits
            .push((paths.to_vec(), author.to_string(), message.to_string()));
        Ok(())
    }

    fn push(&mut self, remote: &str) -> Result<()> {
        self.record(format!("push:{}", remote))
    }

    fn pull(&mut self, remote: &str) -> Result<()> {
        self.record(format!("pull:{}", remote))
    }

    fn reset_index(&mut self) -> Result<()> {
        self.record("reset".to_string())
    }

    fn discard_working_changes(&mut self) -> Result<()> {
        self.record("discard".to_string())
    }

    fn rebase(&mut self, onto: &str) -> Result<()> {
        self.record(format!("rebase:{}", onto))
    }
}
