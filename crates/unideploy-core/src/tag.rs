//! Release tag classification.

/// Markers that flag a tag as a pre-release.
pub const PRERELEASE_MARKERS: [&str; 2] = ["alpha", "beta"];

/// Heuristic pre-release check: the tag contains `alpha` or `beta`.
///
/// This is a plain substring match, not a semver parse: `v2.0.0-rc1` is
/// not a pre-release, `alphabet-1.0` is.
pub fn is_prerelease_tag(tag: &str) -> bool {
    PRERELEASE_MARKERS.iter().any(|marker| tag.contains(marker))
}

/// Effective value of a flag that has a conditional variant.
///
/// The conditional variant only applies when the primary flag is off.
pub fn resolve_conditional(primary: bool, conditional: bool, tag: &str) -> bool {
    primary || (conditional && is_prerelease_tag(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prerelease_markers() {
        assert!(is_prerelease_tag("v1.0.0-alpha"));
        assert!(is_prerelease_tag("v1.0.0-beta.2"));
        assert!(is_prerelease_tag("alphabet-1.0"));
        assert!(!is_prerelease_tag("v2.0.0"));
        assert!(!is_prerelease_tag("v2.0.0-rc1"));
        assert!(!is_prerelease_tag("v2.0.0-ALPHA"));
    }

    #[test]
    fn test_primary_flag_wins() {
        assert!(resolve_conditional(true, false, "v1.0.0"));
        assert!(resolve_conditional(true, true, "v1.0.0"));
    }

    #[test]
    fn test_conditional_flag_uses_tag() {
        assert!(resolve_conditional(false, true, "v1.0.0-beta"));
        assert!(!resolve_conditional(false, true, "v1.0.0"));
        assert!(!resolve_conditional(false, false, "v1.0.0-beta"));
    }
}
