use clap::Parser;
use config::Config;
use errors::{exit_code, Result};
use git::GitRepository;
use migrate::Migrator;

mod config;
mod errors;
mod git;
mod migrate;

const LONG_ABOUT: &str = "\
Moves uncommitted changes from the current branch onto an upstream branch:
  1) stashes the working set and applies it on the upstream branch
  2) commits the changes there and pushes them to the remote
  3) returns to the original branch and rebases it onto the upstream branch

If files are given, only those are committed upstream and the rest of the
working set is re-applied to the original branch afterwards.";

const CAVEATS: &str = "\
Caveats:
  - If the current branch is part of a public repository, think carefully
    before rebasing it.
  - No merge is performed after the rebase.
  - On failure the stash is kept until the changes have been committed and
    pushed and the original branch has been rebased; recover it with
    'git stash apply'.";

#[derive(Debug, Parser)]
#[command(name = "ferry")]
#[command(about = "Move the current working set onto an upstream branch")]
#[command(long_about = LONG_ABOUT, after_help = CAVEATS)]
struct Cli {
    /// Files or directories to commit upstream; all changes when omitted
    files: Vec<String>,

    /// Upstream branch to apply the changes to and rebase onto
    #[arg(short = 'n', long, default_value = "main", value_name = "BRANCH")]
    branch: String,

    /// Remote to push to; pass 'none' to skip pushing
    #[arg(short, long, default_value = "origin", value_name = "REMOTE")]
    remote: String,

    /// Committer name; defaults to user.name from git config
    #[arg(short, long, value_name = "NAME")]
    user: Option<String>,

    /// Committer email; defaults to user.email from git config
    #[arg(short, long, value_name = "EMAIL")]
    email: Option<String>,

    /// Commit message
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Return to the local branch, but do not rebase it
    #[arg(short = 'b', long)]
    norebase: bool,

    /// Keep the stash entry instead of dropping it at the end
    #[arg(short = 'c', long)]
    noclear: bool,

    /// Pull from the remote before committing upstream
    #[arg(short, long)]
    pull: bool,
}

fn main() {
    env_logger::init();

    let args = Cli::parse();

    match run(args) {
        Ok(()) => {
            println!("Ferry complete.");
            std::process::exit(exit_code::SUCCESS);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn run(args: Cli) -> Result<()> {
    let git = GitRepository::discover(".")?;

    let remote = Config::resolve_remote(&args.remote);
    if let Some(name) = &remote {
        git.ensure_remote(name)?;
    }
    let (user, email) = git.committer_identity(args.user, args.email)?;

    let config = Config {
        upstream: args.branch,
        remote,
        user,
        email,
        message: args.message,
        files: args.files,
        skip_rebase: args.norebase,
        keep_stash: args.noclear,
        pull_first: args.pull,
    };

    Migrator::new(git, config)?.run()
}
