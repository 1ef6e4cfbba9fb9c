use std::path::Path;

/// Returns the first of `base`, `base 2`, `base 3`, ... for which neither
/// `<dir>/<candidate>` nor `<dir>/<candidate>.pdf` exists.
///
/// The probe is advisory: nothing is reserved, so two callers resolving the
/// same base name in the same directory at the same time can both get it.
pub fn available_name(dir: &Path, base: &str) -> String {
    let mut counter: u64 = 1;
    loop {
        let candidate = if counter == 1 {
            base.to_string()
        } else {
            format!("{} {}", base, counter)
        };

        if !is_taken(&dir.join(&candidate)) && !is_taken(&dir.join(format!("{}.pdf", candidate)))
        {
            return candidate;
        }

        counter += 1;
    }
}

// symlink_metadata so that dangling symlinks still count as taken. Errors
// other than "not found" (e.g. an unreadable directory) count as free; the
// later directory creation reports them.
fn is_taken(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}
