use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("need a text path, got non-unicode input {0:?}")]
    NotText(std::ffi::OsString),
    #[error("could not determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Resolves textual input into an absolute, normalized path.
///
/// Relative input is joined onto the current directory. Components are then
/// walked left to right: while the path exists on disk each step is
/// canonicalized, so a `..` after a symlink climbs out of the link's target.
/// Past the first missing component `.` and `..` are folded lexically. The
/// path itself does not have to exist.
pub fn resolve(input: impl AsRef<OsStr>) -> Result<PathBuf, PathError> {
    let input = input.as_ref();
    let text = input
        .to_str()
        .ok_or_else(|| PathError::NotText(input.to_os_string()))?;

    let path = Path::new(text);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(PathError::CurrentDir)?
            .join(path)
    };

    Ok(resolve_components(&absolute))
}

/// `clap` value parser for path arguments.
pub fn parse_path_arg(input: &str) -> Result<PathBuf, String> {
    resolve(input).map_err(|e| e.to_string())
}

fn resolve_components(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut on_disk = true;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if !at_root {
                    out.pop();
                }
            }
            Component::Normal(name) => {
                out.push(name);
                if on_disk {
                    match out.canonicalize() {
                        Ok(canonical) => out = canonical,
                        Err(_) => on_disk = false,
                    }
                }
            }
        }
    }
    out
}
