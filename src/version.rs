//! Build metadata for `straico --version` and the `User-Agent` header.

/// Crate version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Branch the binary was built from; "unknown" outside a git checkout.
pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// Commit the binary was built from; "unknown" outside a git checkout.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Whether uncommitted changes were present at build time.
pub fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

/// `0.1.0+main.3f9e2c1`, with `.dirty` appended for a dirty tree.
///
/// A build from a source tarball reads `0.1.0+unknown.unknown`.
pub fn version_string() -> String {
    let short_sha = GIT_SHA.get(..7).unwrap_or(GIT_SHA);
    let dirty = if git_dirty() { ".dirty" } else { "" };
    format!("{PKG_VERSION}+{GIT_BRANCH}.{short_sha}{dirty}")
}

/// `User-Agent` sent on every upstream request, e.g.
/// `straico-gateway/0.1.0+main.3f9e2c1`.
pub fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), version_string())
}
