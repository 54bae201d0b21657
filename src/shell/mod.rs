//! Command execution
//!
//! Runs command line utilities such as kubectl and classifies failures: a
//! command that could not be launched at all is reported separately from one
//! that ran and exited non-zero.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Exit code reported when the process was killed by a signal
pub const NO_EXIT_CODE: i32 = -1;

/// Command execution errors
#[derive(Error, Debug)]
pub enum ShellError {
    /// The executable could not be started, most likely because it is not installed
    #[error("command '{command}' could not be started: {source}")]
    CouldNotStart {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran but did not succeed
    #[error("command '{command}' exited with code {exit_code}: {stderr}")]
    ProblemInExecution {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

impl ShellError {
    pub fn kind(&self) -> &'static str {
        match self {
            ShellError::CouldNotStart { .. } => "could_not_start",
            ShellError::ProblemInExecution { .. } => "problem_in_execution",
        }
    }
}

/// Output of a successful command
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub exit_code: i32,
}

/// Something that can run external commands
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`, adding `env` on top of the inherited environment
    async fn run(
        &self,
        program: &str,
        env: &[(String, String)],
        args: &[String],
    ) -> Result<CommandOutput, ShellError>;
}

/// Runs commands on the local system
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemShell;

#[async_trait]
impl ProcessRunner for SystemShell {
    async fn run(
        &self,
        program: &str,
        env: &[(String, String)],
        args: &[String],
    ) -> Result<CommandOutput, ShellError> {
        let command_line = format!("{} {}", program, args.join(" "));
        debug!("Running command: {}", command_line.trim_end());

        let output = Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .await
            .map_err(|source| ShellError::CouldNotStart {
                command: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(NO_EXIT_CODE);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            debug!("Command exited with code {}: {}", exit_code, stderr.trim());
            return Err(ShellError::ProblemInExecution {
                command: program.to_string(),
                exit_code,
                stderr,
            });
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            exit_code: 0,
        })
    }
}

/// Build the argument list for a kubectl invocation against `kubeconfig`
pub fn kubectl_args(kubeconfig: &str, args: &[&str]) -> Vec<String> {
    let mut all = vec!["--kubeconfig".to_string(), kubeconfig.to_string()];
    all.extend(args.iter().map(|a| a.to_string()));
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[tokio::test]
    async fn test_nonexistent_command_could_not_start() {
        let err = SystemShell
            .run("sdfsdgg", &[], &strings(&["foo"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ShellError::CouldNotStart { .. }));
        assert_eq!(err.kind(), "could_not_start");
    }

    #[tokio::test]
    async fn test_successful_command() {
        let out = SystemShell
            .run("sleep", &[], &strings(&["0"]))
            .await
            .unwrap();

        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, "");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_problem_in_execution() {
        let err = SystemShell
            .run("sh", &[], &strings(&["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap_err();

        match err {
            ShellError::ProblemInExecution {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 3);
                assert_eq!(stderr, "oops\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_environment_override() {
        let env = vec![("TESTVAR".to_string(), "myecho".to_string())];
        let out = SystemShell
            .run("sh", &env, &strings(&["-c", "printf %s \"$TESTVAR\""]))
            .await
            .unwrap();

        assert_eq!(out.stdout, "myecho");
    }

    #[test]
    fn test_kubectl_args() {
        assert_eq!(
            kubectl_args("kc.yaml", &["get", "nodes"]),
            strings(&["--kubeconfig", "kc.yaml", "get", "nodes"])
        );
    }
}
