// src/tasks.rs
use crate::config::Config;
use crate::console::{Console, Output};
use crate::error::ActionError;
use crate::logger::Logger;
use crate::models::Action;
use crate::runner::{CommandRunner, CommandSpec};
use crate::scheduler::{self, BackgroundTask};
use crate::utils::{file_timestamp, tail_lines};
use anyhow::{anyhow, Context};
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Lines shown by the log viewer.
pub const LOG_VIEW_LINES: usize = 50;
/// Lines of a fetched body that are printed.
pub const FETCH_PREVIEW_LINES: usize = 20;
/// Echo requests sent by the ping test.
pub const PING_COUNT: &str = "4";
/// First UID handed out to regular accounts.
pub const MIN_REGULAR_UID: u32 = 1000;

pub const BACKGROUND_COMPLETE: &str = "Background task complete!";

/// Executes the action bound to a menu key.
pub trait ActionHandler {
    fn execute(&mut self, action: Action, console: &Console) -> Result<(), ActionError>;
}

/// The real actions, backed by host tools.
pub struct Toolkit<R: CommandRunner> {
    config: Config,
    logger: Arc<Logger>,
    runner: R,
}

impl<R: CommandRunner> ActionHandler for Toolkit<R> {
    fn execute(&mut self, action: Action, console: &Console) -> Result<(), ActionError> {
        tracing::debug!(?action, "executing menu action");
        let out = console.output();
        match action {
            Action::SystemMonitor => {
                crate::sysinfo::run_system_monitor(&self.runner, out);
                self.record(out, "System monitor viewed");
                Ok(())
            }
            Action::BackupHome => self.backup_home(out),
            Action::ListUsers => self.list_users(out),
            Action::CreateUser => self.create_user(console),
            Action::PingTest => self.ping_test(console),
            Action::FetchUrl => self.fetch_url(console),
            Action::BackgroundTask => self.start_background_task(out),
            Action::ViewLogs => self.view_logs(out),
            Action::Exit => Ok(()),
        }
    }
}

impl<R: CommandRunner> Toolkit<R> {
    pub fn new(config: Config, logger: Arc<Logger>, runner: R) -> Self {
        Self { config, logger, runner }
    }

    /// Logs a completion record. A failed write is reported, never fatal.
    fn record(&self, out: &Output, message: &str) {
        if let Err(e) = self.logger.log(message) {
            tracing::warn!(error = %e, "could not write log record");
            out.line(&format!("warning: could not write to {}: {}", self.logger.path().display(), e));
        }
    }

    fn backup_home(&self, out: &Output) -> Result<(), ActionError> {
        let archive = self
            .config
            .backup_dir
            .join(format!("home_backup_{}.tar.gz", file_timestamp()));
        out.line(&format!(
            "Backing up {} to {} ...",
            self.config.home_dir.display(),
            archive.display()
        ));

        let spec = CommandSpec::new("tar")
            .arg("-czf")
            .arg(&archive)
            .arg("-C")
            .arg(&self.config.home_dir)
            .arg(".");
        let output = self
            .runner
            .run(&spec)
            .context("could not start tar")
            .map_err(ActionError::Fatal)?;
        if !output.success() {
            return Err(ActionError::fatal(anyhow!(
                "backup failed ({}): {}",
                output.describe_status(),
                output.stderr.trim()
            )));
        }

        let message = format!("Backup created: {}", archive.display());
        out.line(&message);
        self.record(out, &message);
        Ok(())
    }

    fn list_users(&self, out: &Output) -> Result<(), ActionError> {
        let path = &self.config.passwd_file;
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))
            .map_err(ActionError::Failed)?;
        let accounts = regular_accounts(&parse_passwd(&text));

        if accounts.is_empty() {
            out.line("No regular user accounts found.");
        } else {
            let mut lines = vec![format!("{:<20} {:>6}  {:<24} {}", "USER", "UID", "HOME", "SHELL")];
            lines.extend(accounts.iter().map(|a| {
                format!("{:<20} {:>6}  {:<24} {}", a.name, a.uid, a.home, a.shell)
            }));
            out.lines(lines);
        }
        self.record(out, &format!("Listed users ({})", accounts.len()));
        Ok(())
    }

    fn create_user(&self, console: &Console) -> Result<(), ActionError> {
        let out = console.output();
        let name = console.prompt_input("Enter new username", "")?;
        validate_username(&name).map_err(ActionError::Failed)?;

        let exists = self
            .runner
            .run(&CommandSpec::new("id").arg(&name))
            .context("could not start id")
            .map_err(ActionError::Fatal)?
            .success();
        if exists {
            out.line(&format!("User '{}' already exists.", name));
            self.record(out, &format!("User {} already exists", name));
            return Ok(());
        }

        let spec = CommandSpec::new("sudo").args(["useradd", "-m"]).arg(&name);
        let output = self
            .runner
            .run(&spec)
            .context("could not start useradd")
            .map_err(ActionError::Fatal)?;
        if !output.success() {
            return Err(ActionError::fatal(anyhow!(
                "failed to create user '{}' ({}): {}",
                name,
                output.describe_status(),
                output.stderr.trim()
            )));
        }

        out.line(&format!("User '{}' created.", name));
        self.record(out, &format!("User created: {}", name));
        Ok(())
    }

    fn ping_test(&self, console: &Console) -> Result<(), ActionError> {
        let out = console.output();
        let host = console.prompt_input("Enter host to ping", "")?;
        validate_host(&host).map_err(ActionError::Failed)?;

        let spec = CommandSpec::new("ping").args(["-c", PING_COUNT]).arg(&host);
        let output = self
            .runner
            .run(&spec)
            .context("could not start ping")
            .map_err(ActionError::Fatal)?;
        if !output.stdout.is_empty() {
            out.write(&output.stdout);
        }
        if !output.success() {
            return Err(ActionError::fatal(anyhow!(
                "ping to {} failed ({}): {}",
                host,
                output.describe_status(),
                output.stderr.trim()
            )));
        }

        self.record(out, &format!("Ping to {} succeeded", host));
        Ok(())
    }

    fn fetch_url(&self, console: &Console) -> Result<(), ActionError> {
        let out = console.output();
        let url = console.prompt_input("Enter URL", "")?;
        if url.is_empty() {
            return Err(ActionError::failed(anyhow!("no URL entered")));
        }

        let (tx, rx) = mpsc::channel();
        let target = url.clone();
        let timeout = self.config.fetch_timeout;
        thread::Builder::new()
            .name("url-fetch".into())
            .spawn(move || {
                // The menu may have given up on us after Ctrl-C.
                let _ = tx.send(fetch(&target, timeout));
            })
            .context("could not start fetch worker")
            .map_err(ActionError::Failed)?;

        let preview = console
            .wait_for(&rx)?
            .ok_or_else(|| anyhow!("fetch worker exited without a result"))
            .and_then(|result| result)
            .with_context(|| format!("fetching {}", url))
            .map_err(ActionError::Fatal)?;

        let mut lines = vec![format!(
            "HTTP {}, first {} lines:",
            preview.status, FETCH_PREVIEW_LINES
        )];
        lines.extend(preview.lines);
        out.lines(lines);
        self.record(out, &format!("Fetched {} (HTTP {})", url, preview.status));
        Ok(())
    }

    fn start_background_task(&self, out: &Output) -> Result<(), ActionError> {
        let task = BackgroundTask::new(self.config.task_delay, BACKGROUND_COMPLETE);
        let logger = Arc::clone(&self.logger);
        let notify = out.clone();

        let handle = scheduler::spawn(task, move |task| {
            if let Err(e) = logger.log(&task.completion_message) {
                tracing::warn!(error = %e, "background task could not write its log record");
            }
            notify.line(&format!(
                "\n[background] {} (started {})",
                task.completion_message,
                task.started_at.format("%H:%M:%S")
            ));
        })
        .context("could not start background task")
        .map_err(ActionError::Failed)?;
        tracing::debug!(thread = ?handle.thread_name(), "background task detached");
        // Dropping the handle detaches the thread; nothing ever joins it.
        drop(handle);

        out.line(&format!(
            "Background task started; it will finish in {} seconds.",
            self.config.task_delay.as_secs()
        ));
        self.record(out, "Background task started");
        Ok(())
    }

    fn view_logs(&self, out: &Output) -> Result<(), ActionError> {
        match read_log_tail(self.logger.path(), LOG_VIEW_LINES) {
            Ok(lines) if lines.is_empty() => out.line("Log file is empty."),
            Ok(lines) => {
                out.heading(&format!("=== Last {} log lines ===", LOG_VIEW_LINES));
                out.lines(lines);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => out.line("No log file found."),
            Err(e) => {
                return Err(ActionError::failed(
                    anyhow::Error::new(e).context(format!("reading {}", self.logger.path().display())),
                ))
            }
        }
        Ok(())
    }
}

/// Last `n` lines of the log file. Invalid UTF-8 is replaced, not rejected.
pub fn read_log_tail(path: &Path, n: usize) -> io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(tail_lines(&text, n).into_iter().map(str::to_string).collect())
}

/// Status and leading body lines of a GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPreview {
    pub status: u16,
    pub lines: Vec<String>,
}

/// GETs `url` and reads at most [`FETCH_PREVIEW_LINES`] lines of the body.
///
/// 4xx and 5xx answers are previews like any other; only transport failures
/// are errors. The rest of the body is never read.
pub fn fetch(url: &str, timeout: Option<Duration>) -> anyhow::Result<FetchPreview> {
    let mut builder = ureq::AgentBuilder::new();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let response = match builder.build().get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(e) => return Err(e.into()),
    };
    let status = response.status();
    let lines = BufReader::new(response.into_reader())
        .split(b'\n')
        .take(FETCH_PREVIEW_LINES)
        .map(|line| {
            line.map(|bytes| {
                String::from_utf8_lossy(&bytes)
                    .trim_end_matches('\r')
                    .to_string()
            })
        })
        .collect::<io::Result<Vec<_>>>()?;
    Ok(FetchPreview { status, lines })
}

/// A row of the account database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub uid: u32,
    pub home: String,
    pub shell: String,
}

/// Parses `/etc/passwd`-formatted text. Comments and malformed rows are skipped.
pub fn parse_passwd(text: &str) -> Vec<Account> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 7 {
                return None;
            }
            Some(Account {
                name: fields[0].to_string(),
                uid: fields[2].parse().ok()?,
                home: fields[5].to_string(),
                shell: fields[6].to_string(),
            })
        })
        .collect()
}

/// Human accounts: UID at or above 1000, `nobody` excluded.
pub fn regular_accounts(accounts: &[Account]) -> Vec<Account> {
    accounts
        .iter()
        .filter(|a| a.uid >= MIN_REGULAR_UID && a.name != "nobody")
        .cloned()
        .collect()
}

/// Accepts the portable `useradd` name set: `[a-z_][a-z0-9_-]*[$]?`, at most 32 bytes.
pub fn validate_username(name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        anyhow::bail!("no username entered");
    }
    if name.len() > 32 {
        anyhow::bail!("username '{}' is longer than 32 characters", name);
    }
    let body = name.strip_suffix('$').unwrap_or(name);
    let mut chars = body.chars();
    let first_ok = chars
        .next()
        .map_or(false, |c| c.is_ascii_lowercase() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !first_ok || !rest_ok {
        anyhow::bail!("invalid username '{}'", name);
    }
    Ok(())
}

/// Host names and IPv4/IPv6 literals (with an optional `%zone`). Anything
/// `ping` could read as an option is rejected.
pub fn validate_host(host: &str) -> anyhow::Result<()> {
    if host.is_empty() {
        anyhow::bail!("no host entered");
    }
    if host.starts_with('-') {
        anyhow::bail!("invalid host '{}'", host);
    }
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '_' | '%'))
    {
        anyhow::bail!("invalid host '{}'", host);
    }
    Ok(())
}
