use std::path::PathBuf;

/// Returns the workspace root directory (parent of the crate directory).
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent()
        .expect("common crate lives inside the workspace")
        .to_path_buf()
}

/// Returns the path to a shared test resource file.
pub fn test_resource(name: &str) -> PathBuf {
    workspace_root().join("test_resources").join(name)
}
