//! Filesystem and environment helpers for output and configuration paths.

use std::{fs, io, path::{Path, PathBuf}};

use super::basic::SError;

pub fn mk_writable_dir(dirpath: &Path) -> io::Result<()> {
    fs::create_dir_all(dirpath)?;

    let mut perms = fs::metadata(dirpath)?.permissions();
    perms.set_readonly(false);
    #[cfg(unix)]
    {
        // Does not apply to Windows
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(0o700);
    }
    fs::set_permissions(dirpath, perms)
}

pub fn env_var_non_empty(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

/// $HOME/.ibtax/, without creating it.
pub fn home_dir_path() -> Result<PathBuf, SError> {
    match dirs::home_dir() {
        Some(d) => Ok(d.join(".ibtax")),
        None => Err(SError::from("Unable to determine home directory")),
    }
}

/// With a file name (eg. config.json), returns a path like
/// $HOME/.ibtax/config.json. The file and directory may not exist.
pub fn home_dir_file_path(fname: &Path) -> Result<PathBuf, SError> {
    Ok(home_dir_path()?.join(fname))
}
