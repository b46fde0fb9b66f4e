use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{CollectError, FileSet, StripPrefix};

/// Collect every regular file under `root` into a [`FileSet`].
///
/// - Directories are traversed but never stored.
/// - Symlinks are not followed; they, and other non-regular entries
///   (sockets, fifos, devices), are skipped with a warning.
/// - Keys are the walked path minus the leading components selected by
///   `strip`, joined with `/`.
///
/// The tree is re-walked on every call.
///
/// # Errors
/// The first walk or read failure aborts collection. A missing `root`
/// is a walk failure. A file left with no components after stripping is
/// [`CollectError::EmptyKey`].
pub fn collect_files(root: &Path, strip: StripPrefix) -> Result<FileSet, CollectError> {
    let skip = match strip {
        StripPrefix::Root => root.components().count(),
        StripPrefix::Segments(n) => n,
    };

    let mut files = FileSet::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|source| CollectError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let ft = entry.file_type();

        if ft.is_dir() {
            debug!(path = %path.display(), "found dir");
            continue;
        }
        if !ft.is_file() {
            warn!(path = %path.display(), "skipping non-regular file");
            continue;
        }

        debug!(path = %path.display(), "found file");
        let key = remote_key(path, skip).ok_or_else(|| CollectError::EmptyKey {
            path: path.to_path_buf(),
            strip: skip,
        })?;
        let content = fs::read(path).map_err(|source| CollectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        files.insert(key, content);
    }

    Ok(files)
}

/// Drop `skip` leading components of `path` and join the rest with `/`.
fn remote_key(path: &Path, skip: usize) -> Option<String> {
    let parts: Vec<String> = path
        .components()
        .skip(skip)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn scaffold(base: &Path) -> PathBuf {
        let root = base.join(".rscaf-work").join("demo-main");
        fs::create_dir_all(root.join("a").join("c")).unwrap();
        fs::write(root.join("a").join("b.txt"), "x").unwrap();
        fs::write(root.join("a").join("c").join("d.txt"), "y").unwrap();
        root
    }

    #[test]
    fn remote_key_strips_leading_components() {
        let p = Path::new("work/demo/a/b/c.go");
        assert_eq!(remote_key(p, 2).as_deref(), Some("a/b/c.go"));
        assert_eq!(remote_key(p, 0).as_deref(), Some("work/demo/a/b/c.go"));
        assert!(remote_key(p, 5).is_none());
    }

    #[test]
    fn collects_leaf_files_relative_to_root() {
        let td = tempdir().unwrap();
        let root = scaffold(td.path());

        let files = collect_files(&root, StripPrefix::Root).unwrap();

        assert_eq!(files.paths().collect::<Vec<_>>(), vec!["a/b.txt", "a/c/d.txt"]);
        assert_eq!(files.get("a/b.txt"), Some(&b"x"[..]));
        assert_eq!(files.get("a/c/d.txt"), Some(&b"y"[..]));
    }

    #[test]
    fn collection_is_repeatable() {
        let td = tempdir().unwrap();
        let root = scaffold(td.path());

        let first = collect_files(&root, StripPrefix::Root).unwrap();
        let second = collect_files(&root, StripPrefix::Root).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn collection_sees_changes_between_calls() {
        let td = tempdir().unwrap();
        let root = scaffold(td.path());

        let before = collect_files(&root, StripPrefix::Root).unwrap();
        fs::write(root.join("new.txt"), "z").unwrap();
        let after = collect_files(&root, StripPrefix::Root).unwrap();

        assert_eq!(before.len() + 1, after.len());
        assert_eq!(after.get("new.txt"), Some(&b"z"[..]));
    }

    #[test]
    fn fixed_segment_strip_matches_relative_walk() {
        let td = tempdir().unwrap();
        let root = scaffold(td.path());
        let depth = td.path().components().count();

        let files = collect_files(&root, StripPrefix::Segments(depth + 2)).unwrap();
        assert_eq!(files.paths().collect::<Vec<_>>(), vec!["a/b.txt", "a/c/d.txt"]);

        let shallow = collect_files(&root, StripPrefix::Segments(depth + 1)).unwrap();
        assert!(shallow.get("demo-main/a/b.txt").is_some());
    }

    #[test]
    fn empty_directory_yields_empty_set() {
        let td = tempdir().unwrap();
        let files = collect_files(td.path(), StripPrefix::Root).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn missing_root_is_a_walk_error() {
        let td = tempdir().unwrap();
        let err = collect_files(&td.path().join("absent"), StripPrefix::Root).unwrap_err();
        assert!(matches!(err, CollectError::Walk { .. }));
    }

    #[test]
    fn over_stripping_is_rejected() {
        let td = tempdir().unwrap();
        let root = scaffold(td.path());
        let err = collect_files(&root, StripPrefix::Segments(64)).unwrap_err();
        assert!(matches!(err, CollectError::EmptyKey { strip: 64, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_a_read_error() {
        use std::os::unix::fs::PermissionsExt;

        let td = tempdir().unwrap();
        let root = scaffold(td.path());
        let locked = root.join("a").join("c").join("d.txt");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&locked).is_ok() {
            // running as root; permission bits are not enforced
            return;
        }

        let err = collect_files(&root, StripPrefix::Root).unwrap_err();
        match err {
            CollectError::Read { path, source } => {
                assert_eq!(path, locked);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped() {
        use std::os::unix::fs as unix_fs;

        let td = tempdir().unwrap();
        let root = scaffold(td.path());
        let outside = td.path().join("secret.txt");
        fs::write(&outside, "nope").unwrap();
        unix_fs::symlink(&outside, root.join("link.txt")).unwrap();
        unix_fs::symlink(root.join("a"), root.join("dirlink")).unwrap();
        unix_fs::symlink(root.join("missing"), root.join("broken")).unwrap();

        let files = collect_files(&root, StripPrefix::Root).unwrap();
        assert_eq!(files.paths().collect::<Vec<_>>(), vec!["a/b.txt", "a/c/d.txt"]);
    }
}
