use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Isolated home directory and session file for one test.
pub struct Sandbox {
    pub home: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn session_file(&self) -> PathBuf {
        self.home.path().join("session.json")
    }

    pub fn session(&self) -> Option<serde_json::Value> {
        let content = std::fs::read_to_string(self.session_file()).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Write a session file as if `auth login` had succeeded.
    pub fn sign_in(&self, access: &str, refresh: &str) {
        let session = serde_json::json!({
            "values": {
                "accessToken": access,
                "refreshToken": refresh,
                "user": r#"{"id":1,"name":"Ana","role":"admin"}"#
            }
        });
        std::fs::write(self.session_file(), session.to_string()).expect("Failed to write session");
    }
}

/// Run the CLI binary against `api_url` with the sandbox's session file.
pub fn run_cli(args: &[&str], sandbox: &Sandbox, api_url: &str) -> Output {
    let session_file = sandbox.session_file();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_assembly"));
    cmd.args(["--api-url", api_url]);
    cmd.arg("--session-file").arg(&session_file);
    cmd.args(args);
    isolate(&mut cmd, sandbox.home.path());
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI from a blocking task so the mock server keeps serving.
pub async fn run_cli_async(args: &[&str], sandbox: &Sandbox, api_url: &str) -> Output {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let session_file = sandbox.session_file();
    let home = sandbox.home.path().to_path_buf();
    let api_url = api_url.to_string();

    tokio::task::spawn_blocking(move || {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_assembly"));
        cmd.args(["--api-url", &api_url]);
        cmd.arg("--session-file").arg(&session_file);
        cmd.args(&args);
        isolate(&mut cmd, &home);
        cmd.output().expect("Failed to execute CLI")
    })
    .await
    .expect("CLI task panicked")
}

fn isolate(cmd: &mut Command, home: &Path) {
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("ASSEMBLY_API_URL");
    cmd.env_remove("ASSEMBLY_TIMEOUT_MS");
    cmd.env_remove("ASSEMBLY_MAX_REFRESH_ATTEMPTS");
    cmd.env_remove("ASSEMBLY_SESSION_FILE");
    cmd.env_remove("RUST_LOG");
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
