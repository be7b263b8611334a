//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// A gpgvault command rooted at the test directory.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("gpgvault").expect("failed to find gpgvault binary");
        cmd.env("GNUPGHOME", self.gnupg.path());
        cmd.env_remove("GPGVAULT_DIR");
        cmd.env_remove("GPGVAULT_KEYSERVER");
        cmd.env_remove("GPGVAULT_LOG");
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `gpgvault set <path> <value>`.
    pub fn set(&self, path: &str, value: &str) -> Output {
        self.cmd()
            .args(["set", path, value])
            .output()
            .expect("failed to run gpgvault set")
    }

    /// Shortcut for `gpgvault get <path>`.
    pub fn get(&self, path: &str) -> Output {
        self.cmd()
            .args(["get", path])
            .output()
            .expect("failed to run gpgvault get")
    }

    /// Shortcut for `gpgvault ls`.
    pub fn ls(&self) -> Output {
        self.cmd()
            .arg("ls")
            .output()
            .expect("failed to run gpgvault ls")
    }
}
