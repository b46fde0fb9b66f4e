mod render;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::load_config;
use crate::progress::{finish_err, finish_ok, spinner};
use crate::provision::{ProvisionRequest, Provisioner, error_chain};
use crate::remote::GitLabClient;
use render::{OutputFormat, render_state};

/// Create a GitLab repository from a rendered scaffold and print the
/// resulting resource state to stdout.
///
/// Process:
/// 1. Validate the request before anything touches the network.
/// 2. Load `config.toml` (or `config`, when given).
/// 3. Build a GitLab client for the request's base URL, falling back to
///    the configured one.
/// 4. Run the provisioning saga with a spinner on stderr.
/// 5. Print `{owner, org, repoName, outputs}` as TOML, or JSON with `json`.
///
/// # Errors
/// Returns the provisioning error, wrapped with the repository path. When
/// the compensating delete also failed, the message names the repository
/// left behind.
pub fn cmd_push(config: Option<&Path>, req: ProvisionRequest, json: bool) -> Result<()> {
    let full_path = req.full_path();
    req.validate()
        .with_context(|| format!("failed to provision {}", full_path))?;

    let cfg = load_config(config)?;
    let client = GitLabClient::from_config(&cfg.gitlab, req.base_url.as_deref())
        .context("failed to build GitLab client")?;
    let provisioner = Provisioner::new(client, cfg.provision_settings());

    let pb = spinner(format!("provisioning {}", full_path));

    match provisioner.provision(&req) {
        Ok(res) => {
            finish_ok(&pb, format!("published {}", res.repo_url));
            let format = if json { OutputFormat::Json } else { OutputFormat::Toml };
            print!("{}", render_state(&res.state(), format)?);
            Ok(())
        }
        Err(e) => {
            finish_err(&pb, format!("provisioning {} (error: {})", full_path, error_chain(&e)));
            Err(e).with_context(|| format!("failed to provision {}", full_path))
        }
    }
}

/// Delete a repository created by an earlier `push`.
pub fn cmd_delete(config: Option<&Path>, req: ProvisionRequest) -> Result<()> {
    let full_path = req.full_path();
    req.validate_target()
        .with_context(|| format!("failed to delete {}", full_path))?;

    let cfg = load_config(config)?;
    let client = GitLabClient::from_config(&cfg.gitlab, req.base_url.as_deref())
        .context("failed to build GitLab client")?;
    let provisioner = Provisioner::new(client, cfg.provision_settings());

    provisioner
        .teardown(&req)
        .with_context(|| format!("failed to delete {}", full_path))?;
    eprintln!("deleted {}", full_path);
    Ok(())
}
