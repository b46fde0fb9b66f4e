use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{NewRepository, RemoteError, RemoteHost, RepositoryHandle};
use crate::collect::FileSet;
use crate::config::GitLabConfig;

/// Blocking client for the GitLab REST API (v4).
pub struct GitLabClient {
    http: Client,
    api: Url,
}

#[derive(Debug, Deserialize)]
struct Namespace {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Project {
    id: u64,
    path_with_namespace: String,
}

#[derive(Debug, Serialize)]
struct CreateProject<'a> {
    name: &'a str,
    path: &'a str,
    visibility: &'static str,
    default_branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct CommitAction<'a> {
    action: &'static str,
    file_path: &'a str,
    content: String,
    encoding: &'static str,
}

#[derive(Debug, Serialize)]
struct CreateCommit<'a> {
    branch: &'a str,
    commit_message: &'a str,
    actions: Vec<CommitAction<'a>>,
}

impl GitLabClient {
    /// Build a client for `base_url` (e.g. `https://gitlab.com`).
    ///
    /// `token` is sent as `PRIVATE-TOKEN` on every request.
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self, RemoteError> {
        let mut api = Url::parse(base_url)?;
        api.path_segments_mut()
            .map_err(|_| RemoteError::Other(format!("{base_url} cannot be a base url")))?
            .pop_if_empty()
            .extend(["api", "v4"]);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("rscaf"));
        if let Some(tok) = token {
            headers.insert("PRIVATE-TOKEN", HeaderValue::from_str(tok)?);
        }
        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, api })
    }

    /// Build a client from the `[gitlab]` config section, reading the token
    /// from the environment variable it names.
    ///
    /// `base_override` takes precedence over the configured base URL.
    pub fn from_config(cfg: &GitLabConfig, base_override: Option<&str>) -> Result<Self, RemoteError> {
        let token = env::var(&cfg.token_env).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            warn!(env_var = %cfg.token_env, "no GitLab token set, requests are anonymous");
        }
        let base = base_override.unwrap_or_else(|| cfg.base_url());
        Self::new(base, token.as_deref(), cfg.timeout())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.api.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Other(format!("{} cannot be a base url", self.api)))?
            .extend(segments);
        Ok(url)
    }

    fn namespace_id(&self, namespace: &str) -> Result<u64, RemoteError> {
        let url = self.endpoint(&["namespaces", namespace])?;
        let resp = check("GET", &url, self.http.get(url.clone()).send()?)?;
        let ns: Namespace = resp.json()?;
        debug!(namespace, id = ns.id, "resolved namespace");
        Ok(ns.id)
    }
}

/// Turn a non-2xx response into [`RemoteError::Status`], keeping the body.
fn check(method: &'static str, url: &Url, resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(RemoteError::Status {
        method,
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

impl RemoteHost for GitLabClient {
    fn create_repository(&self, repo: &NewRepository<'_>) -> Result<RepositoryHandle, RemoteError> {
        let namespace_id = match repo.namespace {
            Some(ns) => Some(self.namespace_id(ns)?),
            None => None,
        };
        let body = CreateProject {
            name: repo.name,
            path: repo.name,
            visibility: repo.visibility.as_str(),
            default_branch: repo.branch,
            namespace_id,
        };

        let url = self.endpoint(&["projects"])?;
        let resp = check("POST", &url, self.http.post(url.clone()).json(&body).send()?)?;
        let project: Project = resp.json()?;
        Ok(RepositoryHandle {
            id: Some(project.id),
            full_path: project.path_with_namespace,
        })
    }

    fn delete_repository(&self, full_path: &str) -> Result<(), RemoteError> {
        let url = self.endpoint(&["projects", full_path])?;
        check("DELETE", &url, self.http.delete(url.clone()).send()?)?;
        Ok(())
    }

    fn commit_files(
        &self,
        full_path: &str,
        branch: &str,
        message: &str,
        files: &FileSet,
    ) -> Result<(), RemoteError> {
        let actions = files
            .iter()
            .map(|(path, content)| CommitAction {
                action: "create",
                file_path: path,
                content: STANDARD.encode(content),
                encoding: "base64",
            })
            .collect();
        let body = CreateCommit {
            branch,
            commit_message: message,
            actions,
        };

        let url = self.endpoint(&["projects", full_path, "repository", "commits"])?;
        check("POST", &url, self.http.post(url.clone()).json(&body).send()?)?;
        Ok(())
    }
}
