//! # rscaf
//!
//! **rscaf** publishes a rendered project scaffold as a new GitLab repository.
//!
//! - `rscaf push <dir> --name demo --org acme` creates `acme/demo` and commits `<dir>`
//! - `rscaf delete --name demo --org acme` removes it again
//! - `rscaf files <dir>` lists what `push` would publish
//! - `rscaf home` prints the rscaf home directory
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rscaf::{ProvisionRequest, Visibility, cmd_delete, cmd_files, cmd_push, init_logger, rscaf_home};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rscaf",
    version,
    about = "rscaf - publish rendered scaffolds as GitLab repositories",
    arg_required_else_help = true
)]
struct Cli {
    /// Config file (default: $(rscaf home)/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Fields addressing a remote repository.
#[derive(Args, Debug)]
struct Target {
    /// Repository name
    #[arg(long)]
    name: String,
    /// Owning user, used when no org is given
    #[arg(long, default_value = "")]
    owner: String,
    /// Group to create the repository in
    #[arg(long, default_value = "")]
    org: String,
    /// GitLab base URL, overriding the config
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Create a repository and commit a rendered scaffold into it
    Push {
        /// Rendered scaffold directory
        path: PathBuf,
        #[command(flatten)]
        target: Target,
        /// Branch to publish to (default: scaffold.default_branch)
        #[arg(long, default_value = "")]
        branch: String,
        /// Repository visibility
        #[arg(long, value_enum, default_value_t = Visibility::Private)]
        visibility: Visibility,
        /// Print the resulting state as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// Delete a repository created by push
    Delete {
        #[command(flatten)]
        target: Target,
    },
    /// List the files push would publish
    Files {
        /// Rendered scaffold directory
        path: PathBuf,
        /// Leading path components to strip (default: the directory itself)
        #[arg(long)]
        strip: Option<usize>,
    },
    /// Print the rscaf home directory
    Home,
}

impl Target {
    fn into_request(self) -> ProvisionRequest {
        ProvisionRequest {
            name: self.name,
            owner: self.owner,
            org: self.org,
            base_url: self.base_url,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let config = cli.config.as_deref();

    match cli.cmd {
        Cmd::Push {
            path,
            target,
            branch,
            visibility,
            json,
        } => {
            let req = ProvisionRequest {
                local_path: path,
                branch,
                visibility,
                ..target.into_request()
            };
            cmd_push(config, req, json)
        }
        Cmd::Delete { target } => cmd_delete(config, target.into_request()),
        Cmd::Files { path, strip } => cmd_files(config, &path, strip),
        Cmd::Home => {
            println!("{}", rscaf_home()?.display());
            Ok(())
        }
    }
}
