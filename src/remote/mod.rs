//! Remote hosting layer.
//!
//! The orchestrator only talks to [`RemoteHost`]; [`GitLabClient`] is the
//! concrete implementation used by the CLI. Errors are opaque to callers
//! beyond success/failure.

mod gitlab;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collect::FileSet;

pub use gitlab::GitLabClient;

/// Host used when neither the request nor the config names one.
pub const DEFAULT_GITLAB_HOST: &str = "https://gitlab.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Internal,
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
        }
    }
}

/// Parameters of a repository creation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRepository<'a> {
    pub name: &'a str,
    /// Group/organization path; `None` creates under the token owner.
    pub namespace: Option<&'a str>,
    pub branch: &'a str,
    pub visibility: Visibility,
}

/// A just-created remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    pub id: Option<u64>,
    /// `namespace/name`, the address used for commits and deletion.
    pub full_path: String,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed")]
    Http(#[from] reqwest::Error),
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    #[error("invalid url")]
    Url(#[from] url::ParseError),
    #[error("invalid header value")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("{0}")]
    Other(String),
}

/// Capabilities the provisioning saga needs from a hosting service.
pub trait RemoteHost {
    fn create_repository(&self, repo: &NewRepository<'_>) -> Result<RepositoryHandle, RemoteError>;

    fn delete_repository(&self, full_path: &str) -> Result<(), RemoteError>;

    fn commit_files(
        &self,
        full_path: &str,
        branch: &str,
        message: &str,
        files: &FileSet,
    ) -> Result<(), RemoteError>;
}

impl<H: RemoteHost + ?Sized> RemoteHost for &H {
    fn create_repository(&self, repo: &NewRepository<'_>) -> Result<RepositoryHandle, RemoteError> {
        (**self).create_repository(repo)
    }

    fn delete_repository(&self, full_path: &str) -> Result<(), RemoteError> {
        (**self).delete_repository(full_path)
    }

    fn commit_files(
        &self,
        full_path: &str,
        branch: &str,
        message: &str,
        files: &FileSet,
    ) -> Result<(), RemoteError> {
        (**self).commit_files(full_path, branch, message, files)
    }
}
