//! Hardcoded build dependencies
//!
//! A few edges of the kernel build graph are not tracked by the `.cmd`
//! mechanism (they are wired up directly in `linux/Kbuild`). This table
//! supplies them until the build system emits them itself.

use std::path::{Path, PathBuf};

use crate::paths;
use crate::report::report_error;

/// Dependencies keyed by path relative to the object tree. `{arch}` expands
/// to `SRCARCH`.
const HARDCODED_DEPENDENCIES: &[(&str, &[&str])] = &[
    ("include/generated/rq-offsets.h", &["kernel/sched/rq-offsets.s"]),
    ("kernel/sched/rq-offsets.s", &["include/generated/asm-offsets.h"]),
    ("include/generated/bounds.h", &["kernel/bounds.s"]),
    ("include/generated/asm-offsets.h", &["arch/{arch}/kernel/asm-offsets.s"]),
];

/// Dependencies of the file at `path` that the build system does not record,
/// as paths relative to the object tree.
pub fn hardcoded_dependencies(path: &Path, obj_tree: &Path, src_tree: &Path) -> Vec<PathBuf> {
    let relative = if paths::is_relative_to(path, obj_tree) {
        paths::relative_to(path, obj_tree)
    } else if paths::is_relative_to(path, src_tree) {
        paths::relative_to(path, src_tree)
    } else {
        path.to_path_buf()
    };

    let Some((_, templates)) = HARDCODED_DEPENDENCIES
        .iter()
        .find(|(key, _)| Path::new(key) == relative)
    else {
        return Vec::new();
    };

    let mut dependencies = Vec::new();
    for template in *templates {
        let Some(dependency) = expand_template(template, &relative) else {
            continue;
        };
        let dependency = PathBuf::from(dependency);
        if obj_tree.join(&dependency).exists() {
            dependencies.push(dependency);
        } else if src_tree.join(&dependency).exists() {
            dependencies.push(paths::relative_to(&src_tree.join(&dependency), obj_tree));
        } else {
            report_error!(
                "Skip hardcoded dependency '{}' for '{}' because the dependency lies neither in the src tree nor the object tree.",
                dependency.display(),
                relative.display()
            );
        }
    }
    dependencies
}

fn expand_template(template: &str, path: &Path) -> Option<String> {
    if !template.contains("{arch}") {
        return Some(template.to_string());
    }
    let Some(srcarch) = crate::env::srcarch() else {
        report_error!(
            "Skipped architecture specific hardcoded dependency for '{}' because the SRCARCH environment variable was not set.",
            path.display()
        );
        return None;
    };
    Some(template.replace("{arch}", &srcarch))
}
