use std::{fs, path::PathBuf};

pub const SAMPLE_STATEMENT: &str = "tests/data/sample_statement.csv";

fn unused_temp_path() -> PathBuf {
    let tmpdir = std::env::temp_dir();
    let pid = std::process::id();
    for val in 1..1000000 {
        let path = tmpdir.join(format!("ibtax-test-{}-{}", pid, val));
        if !path.exists() {
            return path;
        }
    }
    panic!("Could not find a temp directory path that does not already exist");
}

/// A temp directory path for test output. The directory itself is not
/// created, so tests can check that writers create it. Removed on drop
/// unless SKIP_TEMP_DIR_CLEANUP_ON_FAIL is set and the test is failing.
pub struct TestOutputDir {
    pub path: PathBuf,
}

impl TestOutputDir {
    pub fn new() -> TestOutputDir {
        TestOutputDir { path: unused_temp_path() }
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TestOutputDir {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        let skip_env_var = "SKIP_TEMP_DIR_CLEANUP_ON_FAIL";
        if std::thread::panicking() && ibtax::util::os::env_var_non_empty(skip_env_var) {
            println!("Keeping {:?} for inspection", self.path);
        } else {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}
