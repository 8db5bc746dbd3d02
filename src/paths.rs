//! Path helpers
//!
//! Node identity in the cmd graph is the normalized absolute path, so all
//! normalization goes through this module.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component where possible. Does not touch the filesystem.
pub fn normalize<P>(path: P) -> PathBuf
where
    P: AsRef<Path>,
{
    let mut normalized = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) => {}
                _ => normalized.push(".."),
            },
            _ => normalized.push(component),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Absolute path of `target` (relative to `obj_tree`). Symlinks are resolved
/// to their targets when present, otherwise the join is normalized lexically.
pub fn absolutize(obj_tree: &Path, target: &Path) -> PathBuf {
    let joined = obj_tree.join(target);
    if joined.is_symlink() {
        dunce::canonicalize(&joined).unwrap_or_else(|_| normalize(&joined))
    } else {
        normalize(&joined)
    }
}

pub fn is_relative_to(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// Relative path from `base` to `path`. Falls back to `path` itself when no
/// relative path exists (e.g. differing prefixes).
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// The `.cmd` sidecar recorded next to a build artifact: `dir/.name.cmd`.
pub fn cmd_sidecar(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sidecar = format!(".{}.cmd", name);
    match path.parent() {
        Some(parent) => parent.join(sidecar),
        None => PathBuf::from(sidecar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_removes_cur_dir() {
        assert_eq!(normalize("./a.o"), PathBuf::from("a.o"));
        assert_eq!(normalize("a/./b"), PathBuf::from("a/b"));
    }

    #[test]
    fn normalize_folds_parent_dir() {
        assert_eq!(normalize("arch/x86/boot/../../x.o"), PathBuf::from("arch/x.o"));
        assert_eq!(normalize("a/.."), PathBuf::from("."));
        assert_eq!(normalize("../a"), PathBuf::from("../a"));
        assert_eq!(normalize("a/../../b"), PathBuf::from("../b"));
    }

    #[test]
    fn normalize_keeps_root() {
        assert_eq!(normalize("/../a"), PathBuf::from("/a"));
        assert_eq!(normalize("/a/../b"), PathBuf::from("/b"));
    }

    #[test]
    fn cmd_sidecar_dot_prefixes_the_name() {
        assert_eq!(
            cmd_sidecar(Path::new("/obj/arch/x86/boot/bzImage")),
            PathBuf::from("/obj/arch/x86/boot/.bzImage.cmd")
        );
        assert_eq!(cmd_sidecar(Path::new("bzImage")), PathBuf::from(".bzImage.cmd"));
    }

    #[test]
    fn relative_to_diffs_against_base() {
        assert_eq!(
            relative_to(Path::new("/src/linux"), Path::new("/src/linux/build")),
            PathBuf::from("..")
        );
        assert_eq!(
            relative_to(Path::new("/src/a/b.c"), Path::new("/src")),
            PathBuf::from("a/b.c")
        );
    }
}
