use crate::errors::{FerryError, Result};

/// Resolved workflow inputs, immutable for the duration of a run.
///
/// The source branch is not stored here; the migrator captures it from the
/// repository when the run starts.
#[derive(Debug, Clone)]
pub struct Config {
    pub upstream: String,
    pub remote: Option<String>,
    pub user: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub files: Vec<String>,
    pub skip_rebase: bool,
    pub keep_stash: bool,
    pub pull_first: bool,
}

impl Config {
    /// The literal value "none" (any casing) disables pushing entirely.
    pub fn resolve_remote(arg: &str) -> Option<String> {
        if arg.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(arg.to_string())
        }
    }

    /// Author string for the upstream commit: `Name <email>` when both are
    /// known, whichever one is set otherwise.
    pub fn author_string(&self) -> Result<String> {
        match (&self.user, &self.email) {
            (Some(user), Some(email)) => Ok(format!("{} <{}>", user, email)),
            (Some(user), None) => Ok(user.clone()),
            (None, Some(email)) => Ok(email.clone()),
            (None, None) => Err(FerryError::IdentityMissing),
        }
    }
}
