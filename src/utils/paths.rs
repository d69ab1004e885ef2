use std::path::PathBuf;

// Candidate usage-data directories, existing ones only
pub fn usage_data_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(home) = home::home_dir() {
        // Primary path
        paths.push(home.join(".claude"));

        // XDG-style path
        paths.push(home.join(".config/claude"));
    }

    paths.into_iter().filter(|p| p.exists()).collect()
}
