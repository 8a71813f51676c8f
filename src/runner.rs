// src/runner.rs
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::process::{Command, ExitStatus};

/// A program plus its arguments, kept as a list so nothing passes through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// What a finished program left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// `exit status 2`, or `terminated by signal` when there is no code.
    pub fn describe_status(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    fn from_parts(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            code: status.code(),
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }
}

/// Runs external programs for the menu actions.
///
/// A non-zero exit status is a normal `Ok` result; only failing to start or
/// wait for the program is an error.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;
}

/// Runs commands on the host, capturing stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        tracing::debug!(command = %spec, "running external command");
        let output = Command::new(&spec.program).args(&spec.args).output()?;
        let result = CommandOutput::from_parts(output.status, &output.stdout, &output.stderr);
        tracing::debug!(command = %spec, status = %result.describe_status(), "command finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_arguments() {
        let spec = CommandSpec::new("ping").args(["-c", "4"]).arg("example.com");
        assert_eq!(spec.to_string(), "ping -c 4 example.com");
    }

    #[test]
    fn user_text_stays_a_single_argument() {
        let spec = CommandSpec::new("ping").arg("host; rm -rf /");
        assert_eq!(spec.args.len(), 1);
    }

    #[test]
    fn captures_stdout_and_success() {
        let out = SystemRunner
            .run(&CommandSpec::new("echo").arg("hello world"))
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello world\n");
    }

    #[test]
    fn non_zero_exit_is_not_an_error() {
        let out = SystemRunner.run(&CommandSpec::new("false")).unwrap();
        assert!(!out.success());
        assert_eq!(out.code, Some(1));
        assert_eq!(out.describe_status(), "exit status 1");
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = SystemRunner
            .run(&CommandSpec::new("definitely-not-a-real-program-xyz"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn shell_metacharacters_are_not_interpreted() {
        let out = SystemRunner
            .run(&CommandSpec::new("echo").arg("$(whoami) && ls"))
            .unwrap();
        assert_eq!(out.stdout, "$(whoami) && ls\n");
    }
}
