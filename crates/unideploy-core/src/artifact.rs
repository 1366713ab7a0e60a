//! Artifact naming convention for deploy uploads.

/// Directory the packaging step writes archives into.
pub const DEPLOY_DIR: &str = "./Deploy";

/// Path of the archive a provider uploads:
/// `./Deploy/<name>.zip` or `./Deploy/<name>_<tag>.zip`.
pub fn artifact_path(name: &str, version: Option<&str>) -> String {
    match version {
        Some(tag) => format!("{DEPLOY_DIR}/{name}_{tag}.zip"),
        None => format!("{DEPLOY_DIR}/{name}.zip"),
    }
}

/// The provider's configured package name, else the `[Misc]` default.
///
/// `None` means the caller falls back to the repository name.
pub fn configured_package<'a>(section: &'a str, misc: &'a str) -> Option<&'a str> {
    [section, misc].into_iter().find(|name| !name.is_empty())
}
