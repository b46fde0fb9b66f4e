use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::{ProvisionError, ProvisionRequest};

static REPO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

/// Check everything `provision` needs before the first remote call.
pub(crate) fn request(req: &ProvisionRequest) -> Result<(), ProvisionError> {
    target(req)?;

    if req.branch.chars().any(char::is_whitespace) {
        return Err(ProvisionError::validation(
            "branch",
            format!("{:?} contains whitespace", req.branch),
        ));
    }

    if !req.local_path.is_dir() {
        return Err(ProvisionError::validation(
            "local_path",
            format!("{} is not a readable directory", req.local_path.display()),
        ));
    }
    Ok(())
}

/// Check the fields that address a remote repository.
pub(crate) fn target(req: &ProvisionRequest) -> Result<(), ProvisionError> {
    if req.name.is_empty() {
        return Err(ProvisionError::validation("name", "repository name is required"));
    }
    if !REPO_NAME.is_match(&req.name) {
        return Err(ProvisionError::validation(
            "name",
            format!(
                "{:?} must start with a letter or digit and contain only letters, digits, '.', '_' or '-'",
                req.name
            ),
        ));
    }
    if req.owner.is_empty() && req.org.is_empty() {
        return Err(ProvisionError::validation("owner", "either owner or org is required"));
    }
    if let Some(base) = req.base_url.as_deref() {
        base_url(base)?;
    }
    Ok(())
}

fn base_url(raw: &str) -> Result<(), ProvisionError> {
    match Url::parse(raw) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ProvisionError::validation(
                "base_url",
                format!("unsupported scheme {scheme:?}"),
            )),
        },
        Err(e) => Err(ProvisionError::validation(
            "base_url",
            format!("{raw:?} is not a valid url: {e}"),
        )),
    }
}
