use anyhow::Result;
use std::{env, path::PathBuf};

#[derive(Clone)]
pub struct Paths {
    pub config: PathBuf,
}

/// Resolve the rscaf home directory.
///
/// `$XDG_CONFIG_HOME/.rscaf`, falling back to `$HOME/.config/.rscaf`.
pub fn rscaf_home() -> Result<PathBuf> {
    let xdg = env::var_os("XDG_CONFIG_HOME");
    let base = xdg
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    Ok(base.join(".rscaf"))
}

pub fn paths() -> Result<Paths> {
    Ok(Paths {
        config: rscaf_home()?.join("config.toml"),
    })
}
