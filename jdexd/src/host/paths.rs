use std::path::{Component, Path, PathBuf};

use super::HostError;

/// Maps a slash-delimited tree path under `root`.
pub fn fs_path_for(root: &Path, tree_path: &str) -> Result<PathBuf, HostError> {
    let mut out = root.to_path_buf();
    for component in Path::new(tree_path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::RootDir | Component::CurDir => continue,
            Component::ParentDir | Component::Prefix(_) => {
                return Err(HostError::UnsupportedPath(tree_path.to_string()));
            }
        }
    }
    Ok(out)
}

/// Inverse of [`fs_path_for`]; `None` for paths outside `root` or with
/// non-UTF-8 segments.
pub fn tree_path_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}
