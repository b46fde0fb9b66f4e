//! Crate entry point for **rscaf**.
//!
//! rscaf creates a GitLab repository from a locally rendered scaffold and
//! publishes the scaffold as its initial commit. If publishing fails after
//! the repository was created, the repository is deleted again.
//!
//! - [`collect`] walks the scaffold into a [`collect::FileSet`].
//! - [`remote`] defines the [`remote::RemoteHost`] seam and the GitLab client.
//! - [`provision`] runs the create → publish → compensate saga.
//!
//! The `cmd_*` functions back the `rscaf` binary.

pub mod collect;
pub mod config;
mod files;
mod logging;
mod paths;
mod progress;
pub mod provision;
mod push;
pub mod remote;

pub use collect::{FileSet, StripPrefix, collect_files};
pub use config::{Config, load_config};
pub use files::cmd_files;
pub use logging::init_logger;
pub use paths::rscaf_home;
pub use provision::{ProvisionError, ProvisionRequest, ProvisionResult, Provisioner};
pub use push::{cmd_delete, cmd_push};
pub use remote::{GitLabClient, RemoteHost, Visibility};
