// src/sysinfo.rs
use crate::console::Output;
use crate::runner::{CommandRunner, CommandSpec};
use crate::utils::{format_uptime, get_current_time, head_lines};
use sysinfo::System;

/// Lines of `ps` output kept, header included.
const PS_LINES: usize = 11;

/// Tools whose output makes up the monitor report: (section title, program, args).
const MONITOR_COMMANDS: &[(&str, &str, &[&str])] = &[
    ("Uptime", "uptime", &[]),
    ("Logged-in users", "who", &[]),
    ("Memory", "free", &["-h"]),
    ("Disk usage", "df", &["-h"]),
    ("Top processes by memory", "ps", &["aux", "--sort=-%mem"]),
];

/// Host facts shown above the command output.
#[derive(Debug, Clone)]
pub struct HostSummary {
    pub hostname: String,
    pub os_version: String,
    pub kernel_version: String,
    pub uptime_secs: u64,
    pub used_memory: u64,
    pub total_memory: u64,
}

impl HostSummary {
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();

        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .or_else(System::host_name)
            .unwrap_or_default();

        Self {
            hostname,
            os_version: System::long_os_version().unwrap_or_default(),
            kernel_version: System::kernel_version().unwrap_or_default(),
            uptime_secs: System::uptime(),
            used_memory: sys.used_memory(),
            total_memory: sys.total_memory(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
        let used = self.used_memory as f64 / GIB;
        let total = self.total_memory as f64 / GIB;
        let percent = if self.total_memory > 0 {
            self.used_memory as f64 / self.total_memory as f64 * 100.0
        } else {
            0.0
        };
        vec![
            format!("Host:    {}", self.hostname),
            format!("OS:      {}", self.os_version),
            format!("Kernel:  {}", self.kernel_version),
            format!("Uptime:  {}", format_uptime(self.uptime_secs)),
            format!("Memory:  {:.1}/{:.1} GB ({:.1}%)", used, total, percent),
        ]
    }
}

/// Prints the host summary and the output of each monitoring tool.
///
/// A tool that is missing or exits non-zero only produces a warning line;
/// the report carries on with the next one.
pub fn run_system_monitor<R: CommandRunner + ?Sized>(runner: &R, out: &Output) {
    out.heading(&format!("=== System Monitor ({}) ===", get_current_time()));
    out.lines(HostSummary::collect().lines());

    for (title, program, args) in MONITOR_COMMANDS {
        let spec = CommandSpec::new(*program).args(args.iter().copied());
        let mut section = vec![String::new(), format!("--- {} ---", title)];
        match runner.run(&spec) {
            Ok(output) if output.success() => {
                let text = if *program == "ps" {
                    head_lines(&output.stdout, PS_LINES).join("\n")
                } else {
                    output.stdout.trim_end().to_string()
                };
                section.push(if text.is_empty() { "(no output)".to_string() } else { text });
            }
            Ok(output) => {
                section.push(format!(
                    "warning: `{}` failed ({}): {}",
                    spec,
                    output.describe_status(),
                    output.stderr.trim()
                ));
            }
            Err(e) => {
                tracing::warn!(command = %spec, error = %e, "monitor command could not start");
                section.push(format!("warning: could not run `{}`: {}", spec, e));
            }
        }
        out.lines(section);
    }
}
