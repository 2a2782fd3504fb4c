//! Proptest strategies for the gather core's data model.

use gather_core::{Identity, Version};
use proptest::prelude::*;

/// Strategy for generating valid lowercase package ids (`vendor/package`).
pub fn package_id_strategy() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9-]{2,12}", "[a-z][a-z0-9-]{2,12}").prop_map(|(vendor, pkg)| format!("{vendor}/{pkg}"))
}

/// Strategy for generating a dependency target id, distinct-looking from a
/// package id but drawn from the same shape.
pub fn dependency_id_strategy() -> impl Strategy<Value = String> {
    package_id_strategy()
}

/// Strategy for generating four-component [`Version`]s, with an occasional
/// prerelease label.
pub fn version_strategy() -> impl Strategy<Value = Version> {
    (0u64..50, 0u64..50, 0u64..50, 0u64..50, proptest::option::of("alpha|beta|rc")).prop_map(
        |(major, minor, build, revision, pre)| {
            let v = Version::new(major, minor, build, revision);
            match pre {
                Some(p) => v.with_prerelease(p),
                None => v,
            }
        },
    )
}

/// Strategy for generating a full [`Identity`].
pub fn identity_strategy() -> impl Strategy<Value = Identity> {
    (package_id_strategy(), version_strategy()).prop_map(|(id, version)| Identity::new(id, version))
}
