//! Subprocess harness for driving `casared`/`casarectl` as an operator
//! would: spawn the daemon against a throwaway state dir, poll for the
//! admin socket, run CLI commands against it, clean up on drop.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use assert_cmd::cargo::CommandCargoExt;

pub const WAIT_MAX_MS: u64 = 5_000;

/// Poll `check` every 50ms until it returns `true` or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

pub struct Harness {
    _temp: tempfile::TempDir,
    state_dir: PathBuf,
}

impl Harness {
    pub fn empty() -> Self {
        let temp = tempfile::tempdir().expect("create tempdir");
        let state_dir = temp.path().join("state");
        std::fs::create_dir_all(&state_dir).expect("create state dir");
        Self { _temp: temp, state_dir }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn admin_socket(&self) -> PathBuf {
        self.state_dir.join("admin.sock")
    }

    fn base_command(&self, bin: &str) -> Command {
        let mut cmd = Command::cargo_bin(bin).expect("locate binary");
        cmd.env("CASARE_STATE_DIR", &self.state_dir);
        // Fixed, non-default ports: tests run with #[serial] so only one
        // daemon instance is ever up at a time.
        cmd.env("CASARE_WEBSOCKET_BIND", "127.0.0.1:18765");
        cmd.env("CASARE_WEBHOOK_BIND", "127.0.0.1:18766");
        cmd
    }

    pub fn cli(&self) -> CommandSpec {
        CommandSpec { command: self.base_command("casarectl") }
    }

    /// Spawn `casared` in the background and block until its admin socket
    /// appears. The daemon is killed when the returned guard drops.
    pub fn start_daemon(&self) -> DaemonGuard {
        let mut cmd = self.base_command("casared");
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let child = cmd.spawn().expect("spawn casared");
        let socket = self.admin_socket();
        let up = wait_for(WAIT_MAX_MS, || socket.exists());
        assert!(up, "admin socket should appear after daemon start");
        DaemonGuard { child }
    }
}

pub struct DaemonGuard {
    child: Child,
}

impl Drop for DaemonGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub struct CommandSpec {
    command: Command,
}

impl CommandSpec {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.command.args(args);
        self
    }

    pub fn passes(mut self) -> CommandOutput {
        let output = self.command.output().expect("run command");
        assert!(
            output.status.success(),
            "expected success, got status {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        CommandOutput { output }
    }

    pub fn fails(mut self) -> CommandOutput {
        let output = self.command.output().expect("run command");
        assert!(
            !output.status.success(),
            "expected failure, got success\nstdout: {}",
            String::from_utf8_lossy(&output.stdout),
        );
        CommandOutput { output }
    }
}

pub struct CommandOutput {
    output: std::process::Output,
}

impl CommandOutput {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).to_string()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).to_string()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout().contains(needle), "stdout missing {needle:?}, got: {}", self.stdout());
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr().contains(needle), "stderr missing {needle:?}, got: {}", self.stderr());
        self
    }
}
