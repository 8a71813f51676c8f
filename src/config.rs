// src/config.rs
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOG_FILE: &str = "/tmp/admin_toolkit.log";
pub const DEFAULT_BACKUP_DIR: &str = "/tmp/admin_toolkit_backups";
pub const DEFAULT_HOME: &str = "/root";
pub const DEFAULT_PASSWD: &str = "/etc/passwd";
pub const DEFAULT_TASK_DELAY_SECS: u64 = 30;

/// Command-line flags.
#[derive(Parser, Debug)]
#[command(name = "admin-toolkit", version, about = "Interactive Linux administration menu")]
pub struct Cli {
    /// Append-only event log
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Directory that receives home-directory archives
    #[arg(long, value_name = "PATH", default_value = DEFAULT_BACKUP_DIR)]
    pub backup_dir: PathBuf,

    /// Directory archived by the backup action
    #[arg(long, value_name = "PATH", env = "HOME", default_value = DEFAULT_HOME)]
    pub home: PathBuf,

    /// Account database read when listing users
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PASSWD)]
    pub passwd: PathBuf,

    /// Seconds the background task sleeps before completing
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TASK_DELAY_SECS)]
    pub task_delay: u64,

    /// Give up on URL fetches after this many seconds (no limit by default)
    #[arg(long, value_name = "SECS")]
    pub fetch_timeout: Option<u64>,

    /// Report failed backups, user creation, pings and fetches instead of exiting
    #[arg(long)]
    pub keep_going: bool,

    /// Print debug diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Process-wide settings, built once at start-up and handed to every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_file: PathBuf,
    pub backup_dir: PathBuf,
    pub home_dir: PathBuf,
    pub passwd_file: PathBuf,
    pub task_delay: Duration,
    pub fetch_timeout: Option<Duration>,
    pub keep_going: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            home_dir: std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME)),
            passwd_file: PathBuf::from(DEFAULT_PASSWD),
            task_delay: Duration::from_secs(DEFAULT_TASK_DELAY_SECS),
            fetch_timeout: None,
            keep_going: false,
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            log_file: cli.log_file.clone(),
            backup_dir: cli.backup_dir.clone(),
            home_dir: cli.home.clone(),
            passwd_file: cli.passwd.clone(),
            task_delay: Duration::from_secs(cli.task_delay),
            fetch_timeout: cli.fetch_timeout.map(Duration::from_secs),
            keep_going: cli.keep_going,
        }
    }
}
