//! Caret version constraints.
//!
//! Only `^X.Y.Z` is enforced. Any other constraint string, including the empty
//! one, is accepted without checking.

/// Parse `major.minor.patch`, ignoring pre-release and build suffixes.
///
/// Missing trailing components are 0. If any present component is not an
/// unsigned integer the whole version reads as `(0, 0, 0)`.
pub fn parse_semver(version: &str) -> (u64, u64, u64) {
    let core = version
        .split(['-', '+'])
        .next()
        .unwrap_or_default();
    let mut parts = [0u64; 3];
    for (slot, component) in parts.iter_mut().zip(core.split('.')) {
        match component.parse::<u64>() {
            Ok(n) => *slot = n,
            Err(_) => return (0, 0, 0),
        }
    }
    (parts[0], parts[1], parts[2])
}

/// Whether `version` satisfies `constraint`.
pub fn satisfies(version: &str, constraint: &str) -> bool {
    let Some(base) = constraint.strip_prefix('^') else {
        return true;
    };
    let (major, minor, patch) = parse_semver(version);
    let (want_major, want_minor, want_patch) = parse_semver(base);
    major == want_major && (minor, patch) >= (want_minor, want_patch)
}
