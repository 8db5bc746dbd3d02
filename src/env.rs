//! Kernel-build environment variables

/// `ARCH` as set for the kernel build, if any.
pub fn arch() -> Option<String> {
    var("ARCH")
}

/// `SRCARCH` as set for the kernel build. Required by hardcoded-dependency
/// templates that reference `{arch}`.
pub fn srcarch() -> Option<String> {
    var("SRCARCH")
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
