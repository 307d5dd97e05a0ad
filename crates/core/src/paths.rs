//! Request-path to content-path resolution.
//!
//! Every function here is pure and total: any string is a valid path in the
//! content store's address space, so resolution never fails.

/// Prefix for directory listings (`/tree/<path>`).
pub const TREE_PREFIX: &str = "tree";
/// Prefix for explicit file reads (`/file/<path>`).
pub const FILE_PREFIX: &str = "file";

/// First path segments that name a route rather than a file.
///
/// A request whose first segment is in this list is never read as a file,
/// even when no route with that method is registered. Adding a route means
/// adding its segment here first.
pub const RESERVED_SEGMENTS: &[&str] = &[
    TREE_PREFIX,
    FILE_PREFIX,
    "upload",
    "delete",
    "create-folder",
    "update-config",
    "api",
];

/// What a GET request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetTarget {
    /// List the directory at this content path (`""` is the root).
    List(String),
    /// Read the file at this content path.
    Read(String),
    /// A reserved route that has no GET handler.
    Reserved(String),
}

/// Resolve the path of a GET request.
pub fn resolve_get(raw_path: &str) -> GetTarget {
    let path = strip_leading_slash(raw_path);
    if path.is_empty() {
        return GetTarget::List(String::new());
    }

    let (head, rest) = match path.split_once('/') {
        Some((head, rest)) => (head, rest),
        None => (path, ""),
    };

    match head {
        TREE_PREFIX => GetTarget::List(trim_slashes(rest).to_string()),
        FILE_PREFIX => GetTarget::Read(trim_slashes(rest).to_string()),
        _ if is_reserved(head) => GetTarget::Reserved(head.to_string()),
        _ => GetTarget::Read(path.to_string()),
    }
}

/// Strip a routing prefix (`tree/`, `file/`) and the leading slash.
///
/// Paths without a recognized prefix are returned as direct content paths.
/// Empty input maps to the repository root (`""`).
pub fn normalize_route_path(raw_path: &str) -> String {
    match resolve_get(raw_path) {
        GetTarget::List(path) | GetTarget::Read(path) => path,
        GetTarget::Reserved(_) => strip_leading_slash(raw_path).to_string(),
    }
}

pub fn is_reserved(segment: &str) -> bool {
    RESERVED_SEGMENTS.contains(&segment)
}

/// Everything before the last `/`, or `""` when there is none.
pub fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

/// Final path segment.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// `directory/name`, or `name` when `directory` is the root.
pub fn join(directory: &str, name: &str) -> String {
    let directory = trim_slashes(directory);
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{directory}/{name}")
    }
}

/// Request path of the listing for `directory`.
pub fn listing_url(directory: &str) -> String {
    let directory = trim_slashes(directory);
    if directory.is_empty() {
        "/".to_string()
    } else {
        format!("/{TREE_PREFIX}/{directory}")
    }
}

fn strip_leading_slash(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}
