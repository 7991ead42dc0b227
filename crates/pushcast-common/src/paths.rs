//! Path utilities for segment discovery and request targets.
//!
//! The catalog keeps only files whose names end with a configured suffix
//! (`.m4s` for fMP4 media segments) and refers to them by the URL they are
//! served under, `/<mount>/<file name>`.

/// Default suffix of pushable media segments.
pub const DEFAULT_SEGMENT_SUFFIX: &str = ".m4s";

/// Check if a file name ends with `suffix`.
///
/// Matching is case-sensitive and exact, an empty suffix matches everything.
///
/// # Examples
///
/// ```
/// use pushcast_common::paths::has_suffix;
///
/// assert!(has_suffix("segment-003.m4s", ".m4s"));
/// assert!(!has_suffix("init.mp4", ".m4s"));
/// assert!(!has_suffix("segment-003.M4S", ".m4s"));
/// ```
pub fn has_suffix(file_name: &str, suffix: &str) -> bool {
    file_name.ends_with(suffix)
}

/// Build the request target for `file_name` served under `mount`.
///
/// Leading and trailing slashes on `mount` are ignored.
///
/// # Examples
///
/// ```
/// use pushcast_common::paths::mount_target;
///
/// assert_eq!(mount_target("public", "a.m4s"), "/public/a.m4s");
/// assert_eq!(mount_target("/public/", "a.m4s"), "/public/a.m4s");
/// ```
pub fn mount_target(mount: &str, file_name: &str) -> String {
    format!("/{}/{}", mount.trim_matches('/'), file_name)
}

/// Route prefix a mount is served under, e.g. `/public`.
///
/// # Examples
///
/// ```
/// use pushcast_common::paths::mount_path;
///
/// assert_eq!(mount_path("public"), "/public");
/// ```
pub fn mount_path(mount: &str) -> String {
    format!("/{}", mount.trim_matches('/'))
}
