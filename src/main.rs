use anyhow::Result;
use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;
use minus::Pager;
use std::process::ExitCode;
use strata::areas::repository::Repository;
use strata::artifacts::pager::PagerWriter;
use strata::errors::repository_error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "strata",
    version = "0.1.0",
    about = "A small local version-control system",
    long_about = "strata snapshots a flat working directory into content-addressed \
    commits, with branches and three-way merges. All history lives in a local \
    .strata directory.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[arg(
        short = 'C',
        long = "work-tree",
        env = "STRATA_WORK_TREE",
        global = true,
        help = "Run as if started in this directory"
    )]
    work_tree: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "init", about = "Create an empty repository")]
    Init,
    #[command(name = "add", about = "Stage a file for the next commit")]
    Add {
        #[arg(index = 1)]
        file: String,
    },
    #[command(name = "commit", about = "Record the staged changes")]
    Commit {
        #[arg(index = 1, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "rm",
        about = "Unstage a file, or stage the removal of a tracked file",
        long_about = "Unstages a file staged for addition. If the file is tracked by the \
        current commit it is also staged for removal and deleted from the working directory."
    )]
    Rm {
        #[arg(index = 1)]
        file: String,
    },
    #[command(name = "log", about = "Show the history of the current branch")]
    Log,
    #[command(name = "global-log", about = "Show every commit ever made")]
    GlobalLog,
    #[command(name = "find", about = "Print the ids of commits with the given message")]
    Find {
        #[arg(index = 1)]
        message: String,
    },
    #[command(name = "status", about = "Show branches, staged files and working tree changes")]
    Status,
    #[command(
        name = "checkout",
        about = "Switch branches or restore a file",
        long_about = "checkout <branch> switches to a branch. \
        checkout -- <file> restores a file from the current commit. \
        checkout <commit> -- <file> restores a file from the given commit.",
        override_usage = "strata checkout <branch>\n       \
        strata checkout -- <file>\n       \
        strata checkout <commit> -- <file>"
    )]
    Checkout {
        #[arg(index = 1, help = "Branch name, or commit id when restoring a file")]
        target: Option<String>,
        #[arg(index = 2, last = true, help = "File to restore")]
        file: Option<String>,
    },
    #[command(name = "branch", about = "Create a branch at the current commit")]
    Branch {
        #[arg(index = 1)]
        name: String,
    },
    #[command(name = "rm-branch", about = "Delete a branch")]
    RmBranch {
        #[arg(index = 1)]
        name: String,
    },
    #[command(name = "reset", about = "Check out a commit and move the current branch to it")]
    Reset {
        #[arg(index = 1, help = "Full or abbreviated commit id")]
        commit: String,
    },
    #[command(name = "merge", about = "Merge a branch into the current branch")]
    Merge {
        #[arg(index = 1)]
        branch: String,
    },
}

impl Commands {
    fn is_paged(&self) -> bool {
        matches!(self, Commands::Log | Commands::GlobalLog)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("STRATA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => match repository_error(&error) {
            Some(repository_error) => {
                println!("{repository_error}");
                if repository_error.is_fatal() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }
            None => {
                eprintln!("error: {error:?}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    let is_terminal = std::io::stdout().is_terminal();
    if !is_terminal {
        colored::control::set_override(false);
    }

    let work_tree = match cli.work_tree {
        Some(path) => path,
        None => std::env::current_dir()?.to_string_lossy().into_owned(),
    };

    let pager = (cli.command.is_paged() && is_terminal && std::env::var_os("NO_PAGER").is_none())
        .then(Pager::new);
    let writer: Box<dyn std::io::Write> = match &pager {
        Some(pager) => Box::new(PagerWriter::new(pager.clone())),
        None => Box::new(std::io::stdout()),
    };

    let repository = Repository::new(&work_tree, writer)?;
    execute(&repository, cli.command)?;
    // flushes buffered output into the pager
    drop(repository);

    if let Some(pager) = pager {
        minus::page_all(pager)?;
    }

    Ok(())
}

fn execute(repository: &Repository, command: Commands) -> Result<()> {
    match command {
        Commands::Init => repository.init(),
        Commands::Add { file } => repository.add(&file),
        Commands::Commit { message } => repository.commit(&message),
        Commands::Rm { file } => repository.rm(&file),
        Commands::Log => repository.log(),
        Commands::GlobalLog => repository.global_log(),
        Commands::Find { message } => repository.find(&message),
        Commands::Status => repository.status(),
        Commands::Checkout { target, file } => match (target, file) {
            (target, Some(file)) => repository.checkout_file(target.as_deref(), &file),
            (Some(branch), None) => repository.checkout_branch(&branch),
            (None, None) => anyhow::bail!("checkout needs a branch, or -- <file>"),
        },
        Commands::Branch { name } => repository.branch(&name),
        Commands::RmBranch { name } => repository.rm_branch(&name),
        Commands::Reset { commit } => repository.reset(&commit),
        Commands::Merge { branch } => repository.merge(&branch),
    }
}
