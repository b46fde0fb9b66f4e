//! Repository provisioning.
//!
//! [`Provisioner::provision`] creates a remote repository and publishes a
//! rendered scaffold into it as one commit. Creation is the only step that
//! needs no undo; once it succeeds a compensating delete is registered and
//! runs if anything afterwards fails, so the remote side ends up either
//! fully populated or without the repository.

mod error;
mod saga;
mod validate;

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::collect::{StripPrefix, collect_files};
use crate::remote::{
    DEFAULT_GITLAB_HOST, NewRepository, RemoteHost, RepositoryHandle, Visibility,
};

pub use error::{CompensationFailed, ProvisionError};
pub use saga::{Compensations, Stage};

pub(crate) use error::error_chain;
use error::PublishFailure;
use saga::Saga;

pub const DEFAULT_MAIN_BRANCH: &str = "main";
pub const DEFAULT_COMMIT_MESSAGE: &str = "initialized by rscaf";

/// Knobs that do not vary per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSettings {
    pub default_branch: String,
    pub commit_message: String,
    /// Host used for clone URLs when the request has no `base_url`.
    pub default_base_url: String,
    pub strip: StripPrefix,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            default_branch: DEFAULT_MAIN_BRANCH.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            default_base_url: DEFAULT_GITLAB_HOST.to_string(),
            strip: StripPrefix::Root,
        }
    }
}

/// One repository to create from a rendered scaffold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// Rendered scaffold root; must be an existing directory.
    pub local_path: PathBuf,
    pub name: String,
    pub owner: String,
    /// Group the repository is created in. Takes precedence over `owner`.
    pub org: String,
    /// Empty means the configured default branch.
    pub branch: String,
    pub visibility: Visibility,
    pub base_url: Option<String>,
}

impl ProvisionRequest {
    fn namespace(&self) -> Option<&str> {
        (!self.org.is_empty()).then_some(self.org.as_str())
    }

    fn org_or_owner(&self) -> &str {
        self.namespace().unwrap_or(&self.owner)
    }

    /// `org-or-owner/name`.
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.org_or_owner(), self.name)
    }

    /// Everything [`Provisioner::provision`] checks before its first
    /// remote call.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        validate::request(self)
    }

    /// The addressing fields only, as checked by [`Provisioner::teardown`].
    pub fn validate_target(&self) -> Result<(), ProvisionError> {
        validate::target(self)
    }
}

/// Outcome of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionResult {
    pub owner: String,
    pub org: String,
    pub repo: String,
    pub repo_url: String,
}

/// Resource state recorded for downstream steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceState {
    pub owner: String,
    pub org: String,
    #[serde(rename = "repoName")]
    pub repo_name: String,
    pub outputs: Outputs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outputs {
    pub owner: String,
    pub org: String,
    pub repo: String,
    #[serde(rename = "repoURL")]
    pub repo_url: String,
}

impl ProvisionResult {
    pub fn state(&self) -> ResourceState {
        ResourceState {
            owner: self.owner.clone(),
            org: self.org.clone(),
            repo_name: self.repo.clone(),
            outputs: Outputs {
                owner: self.owner.clone(),
                org: self.org.clone(),
                repo: self.repo.clone(),
                repo_url: self.repo_url.clone(),
            },
        }
    }
}

pub struct Provisioner<H> {
    host: H,
    settings: ProvisionSettings,
}

impl<H: RemoteHost> Provisioner<H> {
    pub fn new(host: H, settings: ProvisionSettings) -> Self {
        Self { host, settings }
    }

    pub fn settings(&self) -> &ProvisionSettings {
        &self.settings
    }

    /// Branch to create and publish to. Never empty.
    pub fn resolve_branch<'a>(&'a self, req: &'a ProvisionRequest) -> &'a str {
        if !req.branch.is_empty() {
            &req.branch
        } else if self.settings.default_branch.is_empty() {
            DEFAULT_MAIN_BRANCH
        } else {
            &self.settings.default_branch
        }
    }

    /// `<base>/<org-or-owner>/<name>.git`.
    pub fn clone_url(&self, req: &ProvisionRequest) -> String {
        let base = req
            .base_url
            .as_deref()
            .unwrap_or(&self.settings.default_base_url)
            .trim_end_matches('/');
        format!("{}/{}/{}.git", base, req.org_or_owner(), req.name)
    }

    /// Create the repository described by `req` and publish its scaffold.
    ///
    /// # Errors
    /// - [`ProvisionError::Validation`] before any remote call.
    /// - [`ProvisionError::CreateFailed`]: nothing was created.
    /// - [`ProvisionError::Collection`] / [`ProvisionError::CommitFailed`]:
    ///   the repository was deleted again, or the failed deletion is
    ///   attached as a cleanup failure.
    pub fn provision(&self, req: &ProvisionRequest) -> Result<ProvisionResult, ProvisionError> {
        validate::request(req)?;

        let branch = self.resolve_branch(req);
        let mut saga = Saga::new();

        saga.advance(Stage::Creating);
        let created = self.host.create_repository(&NewRepository {
            name: &req.name,
            namespace: req.namespace(),
            branch,
            visibility: req.visibility,
        });
        let handle = match created {
            Ok(handle) => handle,
            Err(source) => {
                saga.advance(Stage::CreateFailed);
                error!(repo = %req.name, error = %error_chain(&source), "failed to create repo");
                return Err(ProvisionError::CreateFailed {
                    name: req.name.clone(),
                    source,
                });
            }
        };
        saga.advance(Stage::Created);
        info!(repo = %handle.full_path, "repo has been created");

        let mut undo = Compensations::new();
        let host = &self.host;
        let target = handle.full_path.clone();
        undo.push(handle.full_path.clone(), move || host.delete_repository(&target));

        saga.advance(Stage::Publishing);
        let outcome = match self.publish(req, &handle, branch) {
            Ok(()) => {
                undo.disarm();
                saga.advance(Stage::Published);
                info!(repo = %handle.full_path, %branch, "scaffold published");
                Ok(ProvisionResult {
                    owner: req.owner.clone(),
                    org: req.org.clone(),
                    repo: req.name.clone(),
                    repo_url: self.clone_url(req),
                })
            }
            Err(failure) => {
                saga.advance(Stage::PublishFailed);
                error!(repo = %handle.full_path, error = %failure, "failed to push to remote");

                saga.advance(Stage::Compensating);
                let cleanup = undo.run();
                saga.advance(if cleanup.is_empty() {
                    Stage::Compensated
                } else {
                    Stage::CompensationFailed
                });
                Err(failure.with_cleanup(cleanup))
            }
        };

        debug!(stage = ?saga.stage(), history = ?saga.history(), "provisioning finished");
        outcome
    }

    fn publish(
        &self,
        req: &ProvisionRequest,
        handle: &RepositoryHandle,
        branch: &str,
    ) -> Result<(), PublishFailure> {
        let files =
            collect_files(&req.local_path, self.settings.strip).map_err(PublishFailure::Collection)?;
        info!(files = files.len(), bytes = files.total_bytes(), "collected scaffold");

        self.host
            .commit_files(&handle.full_path, branch, &self.settings.commit_message, &files)
            .map_err(|source| PublishFailure::Commit {
                path: handle.full_path.clone(),
                source,
            })
    }

    /// Delete a repository provisioned earlier. Only the addressing fields
    /// of `req` are used.
    pub fn teardown(&self, req: &ProvisionRequest) -> Result<(), ProvisionError> {
        validate::target(req)?;
        let path = req.full_path();
        self.host
            .delete_repository(&path)
            .map_err(|source| ProvisionError::Teardown { path: path.clone(), source })?;
        info!(repo = %path, "repo has been deleted");
        Ok(())
    }
}
