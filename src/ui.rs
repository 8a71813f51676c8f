// src/ui.rs
use crate::console::{Console, InputEvent, Output};
use crate::error::{ActionError, InputEnd};
use crate::logger::Logger;
use crate::models::{Action, Menu, MenuItem};
use crate::tasks::ActionHandler;
use std::process::ExitCode;

pub const MENU_TITLE: &str = "===== System Admin Toolkit =====";
pub const PROMPT: &str = "Choose an option: ";
pub const INVALID_CHOICE: &str = "Invalid choice.";
pub const STARTED_RECORD: &str = "Script started";
pub const EXITED_RECORD: &str = "Script exited";

/// Defines all menu entries.
pub fn get_menu_items() -> Vec<MenuItem> {
    vec![
        MenuItem::new('1', "System Monitor", Action::SystemMonitor),
        MenuItem::new('2', "Backup Home Directory", Action::BackupHome),
        MenuItem::new('3', "List Users", Action::ListUsers),
        MenuItem::new('4', "Create User", Action::CreateUser),
        MenuItem::new('5', "Ping Test", Action::PingTest),
        MenuItem::new('6', "Fetch URL", Action::FetchUrl),
        MenuItem::new('7', "Run Background Task", Action::BackgroundTask),
        MenuItem::new('8', "View Logs", Action::ViewLogs),
        MenuItem::new('9', "Exit", Action::Exit),
    ]
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    Exited,
    Interrupted,
    InputClosed,
    Fatal(anyhow::Error),
}

impl SessionEnd {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SessionEnd::Fatal(_) => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        }
    }

    fn from_input_end(end: InputEnd) -> Self {
        match end {
            InputEnd::Interrupted => SessionEnd::Interrupted,
            InputEnd::Closed => SessionEnd::InputClosed,
        }
    }
}

/// Logs the start record on creation and the exit record when dropped, so
/// every way out of the session (including a panic) leaves one exit line.
pub struct SessionGuard<'a> {
    logger: &'a Logger,
}

impl<'a> SessionGuard<'a> {
    pub fn start(logger: &'a Logger) -> Self {
        log_or_warn(logger, STARTED_RECORD);
        Self { logger }
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        log_or_warn(self.logger, EXITED_RECORD);
    }
}

fn log_or_warn(logger: &Logger, message: &str) {
    if let Err(e) = logger.log(message) {
        tracing::warn!(error = %e, record = message, "could not write log record");
    }
}

/// Synchronous read-eval loop over a [`Menu`].
pub struct Dispatcher<'a> {
    menu: &'a Menu,
    console: &'a Console,
    logger: &'a Logger,
    keep_going: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(menu: &'a Menu, console: &'a Console, logger: &'a Logger) -> Self {
        Self {
            menu,
            console,
            logger,
            keep_going: false,
        }
    }

    /// Treat fatal action failures like soft ones.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    fn out(&self) -> &Output {
        self.console.output()
    }

    fn render(&self) {
        let out = self.out();
        out.write("\n");
        out.heading(MENU_TITLE);
        out.lines(self.menu.iter().map(|item| format!("{}. {}", item.key, item.label)));
    }

    /// Runs until Exit, Ctrl-C, end of input or a fatal action failure.
    pub fn run<H: ActionHandler + ?Sized>(&self, handler: &mut H) -> SessionEnd {
        loop {
            self.render();
            self.out().write(PROMPT);

            let choice = match self.console.next_event() {
                InputEvent::Line(line) => line,
                InputEvent::Interrupt => return self.finish(SessionEnd::Interrupted),
                InputEvent::Eof => return self.finish(SessionEnd::InputClosed),
            };

            let Some(item) = self.menu.resolve(choice.trim()) else {
                self.out().line(INVALID_CHOICE);
                continue;
            };
            if item.action == Action::Exit {
                return self.finish(SessionEnd::Exited);
            }

            tracing::debug!(key = %item.key, label = item.label, "menu selection");
            match handler.execute(item.action, self.console) {
                Ok(()) => {}
                Err(ActionError::Failed(e)) => self.report_soft(&e),
                Err(ActionError::Fatal(e)) if self.keep_going => {
                    log_or_warn(self.logger, &format!("ERROR: {:#}", e));
                    self.out().error(&format!("{:#}", e));
                }
                Err(ActionError::Fatal(e)) => {
                    log_or_warn(self.logger, &format!("ERROR: {:#}", e));
                    self.out().error(&format!("{:#}", e));
                    return SessionEnd::Fatal(e);
                }
                Err(ActionError::Aborted(end)) => {
                    return self.finish(SessionEnd::from_input_end(end))
                }
            }
        }
    }

    fn report_soft(&self, err: &anyhow::Error) {
        let message = format!("Unhandled exception: {:#}", err);
        log_or_warn(self.logger, &message);
        self.out().line(&message);
    }

    fn finish(&self, end: SessionEnd) -> SessionEnd {
        match &end {
            SessionEnd::Exited => self.out().line("Exiting..."),
            SessionEnd::Interrupted => self.out().line("\nInterrupted by user. Exiting..."),
            SessionEnd::InputClosed => self.out().line("\nEnd of input. Exiting..."),
            SessionEnd::Fatal(_) => {}
        }
        end
    }
}

/// One full session: start record, menu loop, exit record.
pub fn run_session<H: ActionHandler + ?Sized>(
    menu: &Menu,
    console: &Console,
    logger: &Logger,
    handler: &mut H,
    keep_going: bool,
) -> SessionEnd {
    let _guard = SessionGuard::start(logger);
    Dispatcher::new(menu, console, logger)
        .keep_going(keep_going)
        .run(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::SharedBuffer;
    use anyhow::anyhow;
    use std::fs;
    use tempfile::TempDir;

    /// Records which actions ran; optionally fails a chosen one.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<Action>,
        fail_soft: Option<Action>,
        fail_fatal: Option<Action>,
    }

    impl ActionHandler for Recorder {
        fn execute(&mut self, action: Action, _console: &Console) -> Result<(), ActionError> {
            self.calls.push(action);
            if self.fail_soft == Some(action) {
                return Err(ActionError::failed(anyhow!("disk on fire")));
            }
            if self.fail_fatal == Some(action) {
                return Err(ActionError::fatal(anyhow!("tar exploded")));
            }
            Ok(())
        }
    }

    struct Harness {
        _dir: TempDir,
        logger: Logger,
        buf: SharedBuffer,
        menu: Menu,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let logger = Logger::new(dir.path().join("toolkit.log"));
            Self {
                _dir: dir,
                logger,
                buf: SharedBuffer::default(),
                menu: Menu::new(get_menu_items()).unwrap(),
            }
        }

        fn run(&self, events: Vec<InputEvent>, handler: &mut Recorder, keep_going: bool) -> SessionEnd {
            let console = Console::from_events(events, Output::from_writer(self.buf.clone()));
            run_session(&self.menu, &console, &self.logger, handler, keep_going)
        }

        fn run_lines(&self, lines: &[&str], handler: &mut Recorder) -> SessionEnd {
            let events = lines
                .iter()
                .map(|l| InputEvent::Line(format!("{}\n", l)))
                .collect();
            self.run(events, handler, false)
        }

        fn log(&self) -> Vec<String> {
            fs::read_to_string(self.logger.path())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }

        fn exit_records(&self) -> usize {
            self.log().iter().filter(|l| l.ends_with(EXITED_RECORD)).count()
        }
    }

    fn lines(raw: &[&str]) -> Vec<InputEvent> {
        raw.iter().map(|l| InputEvent::Line(format!("{}\n", l))).collect()
    }

    #[test]
    fn each_key_invokes_exactly_its_action() {
        let expected = [
            ('1', Action::SystemMonitor),
            ('2', Action::BackupHome),
            ('3', Action::ListUsers),
            ('4', Action::CreateUser),
            ('5', Action::PingTest),
            ('6', Action::FetchUrl),
            ('7', Action::BackgroundTask),
            ('8', Action::ViewLogs),
        ];
        for (key, action) in expected {
            let h = Harness::new();
            let mut rec = Recorder::default();
            let key = key.to_string();
            let end = h.run_lines(&[key.as_str(), "9"], &mut rec);
            assert!(matches!(end, SessionEnd::Exited));
            assert_eq!(rec.calls, vec![action]);
        }
    }

    #[test]
    fn invalid_input_invokes_nothing() {
        let h = Harness::new();
        let mut rec = Recorder::default();
        let end = h.run_lines(&["", "0", "x", "12", "  ", "exit", "9"], &mut rec);

        assert!(matches!(end, SessionEnd::Exited));
        assert!(rec.calls.is_empty());
        assert_eq!(h.buf.contents().matches(INVALID_CHOICE).count(), 6);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let h = Harness::new();
        let mut rec = Recorder::default();
        h.run_lines(&["  3 \t", " 9 "], &mut rec);
        assert_eq!(rec.calls, vec![Action::ListUsers]);
    }

    #[test]
    fn menu_is_rendered_in_key_order_each_iteration() {
        let h = Harness::new();
        let mut rec = Recorder::default();
        h.run_lines(&["x", "9"], &mut rec);

        let text = h.buf.contents();
        assert_eq!(text.matches(MENU_TITLE).count(), 2);
        assert_eq!(text.matches(PROMPT).count(), 2);
        let first_menu: Vec<&str> = text
            .lines()
            .filter(|l| l.len() > 2 && l.as_bytes()[1] == b'.')
            .take(9)
            .collect();
        assert_eq!(first_menu.first(), Some(&"1. System Monitor"));
        assert_eq!(first_menu.last(), Some(&"9. Exit"));
    }

    #[test]
    fn soft_failure_is_logged_and_loop_continues() {
        let h = Harness::new();
        let mut rec = Recorder {
            fail_soft: Some(Action::ListUsers),
            ..Recorder::default()
        };
        let end = h.run_lines(&["3", "8", "9"], &mut rec);

        assert!(matches!(end, SessionEnd::Exited));
        assert_eq!(rec.calls, vec![Action::ListUsers, Action::ViewLogs]);
        assert!(h.buf.contents().contains("Unhandled exception: disk on fire"));
        assert!(h.log().iter().any(|l| l.ends_with("Unhandled exception: disk on fire")));
    }

    #[test]
    fn fatal_failure_ends_session_with_failure_status() {
        let h = Harness::new();
        let mut rec = Recorder {
            fail_fatal: Some(Action::BackupHome),
            ..Recorder::default()
        };
        let end = h.run_lines(&["2", "3", "9"], &mut rec);

        match &end {
            SessionEnd::Fatal(e) => assert_eq!(e.to_string(), "tar exploded"),
            other => panic!("expected a fatal end, got {:?}", other),
        }
        assert_eq!(end.exit_code(), ExitCode::FAILURE);
        assert_eq!(rec.calls, vec![Action::BackupHome]);
        assert!(h.buf.contents().contains("ERROR: tar exploded"));
        assert!(h.log().iter().any(|l| l.ends_with("ERROR: tar exploded")));
        assert_eq!(h.exit_records(), 1);
    }

    #[test]
    fn keep_going_demotes_fatal_failures() {
        let h = Harness::new();
        let mut rec = Recorder {
            fail_fatal: Some(Action::PingTest),
            ..Recorder::default()
        };
        let end = h.run(lines(&["5", "3", "9"]), &mut rec, true);

        assert!(matches!(end, SessionEnd::Exited));
        assert_eq!(rec.calls, vec![Action::PingTest, Action::ListUsers]);
        assert!(h.buf.contents().contains("ERROR: tar exploded"));
    }

    #[test]
    fn exit_logs_exactly_one_shutdown_record() {
        let h = Harness::new();
        let end = h.run_lines(&["9"], &mut Recorder::default());
        assert_eq!(end.exit_code(), ExitCode::SUCCESS);

        let log = h.log();
        assert_eq!(log.len(), 2);
        assert!(log[0].ends_with(STARTED_RECORD));
        assert!(log[1].ends_with(EXITED_RECORD));
    }

    #[test]
    fn interrupt_logs_exactly_one_shutdown_record() {
        let h = Harness::new();
        let mut events = lines(&["x"]);
        events.push(InputEvent::Interrupt);
        events.extend(lines(&["1"]));
        let mut rec = Recorder::default();
        let end = h.run(events, &mut rec, false);

        assert!(matches!(end, SessionEnd::Interrupted));
        assert_eq!(end.exit_code(), ExitCode::SUCCESS);
        assert!(rec.calls.is_empty());
        assert!(h.buf.contents().contains("Interrupted by user."));
        assert_eq!(h.exit_records(), 1);
    }

    #[test]
    fn end_of_input_behaves_like_exit() {
        let h = Harness::new();
        let end = h.run_lines(&["3"], &mut Recorder::default());
        assert!(matches!(end, SessionEnd::InputClosed));
        assert_eq!(end.exit_code(), ExitCode::SUCCESS);
        assert_eq!(h.exit_records(), 1);
    }

    #[test]
    fn aborted_prompt_ends_session() {
        struct Aborting;
        impl ActionHandler for Aborting {
            fn execute(&mut self, _: Action, _: &Console) -> Result<(), ActionError> {
                Err(ActionError::Aborted(InputEnd::Interrupted))
            }
        }

        let h = Harness::new();
        let console = Console::from_events(lines(&["4", "9"]), Output::from_writer(h.buf.clone()));
        let end = run_session(&h.menu, &console, &h.logger, &mut Aborting, false);
        assert!(matches!(end, SessionEnd::Interrupted));
        assert_eq!(h.exit_records(), 1);
    }

    #[test]
    fn standard_menu_has_nine_unique_keys() {
        let menu = Menu::new(get_menu_items()).unwrap();
        assert_eq!(menu.len(), 9);
        let keys: String = menu.iter().map(|i| i.key).collect();
        assert_eq!(keys, "123456789");
    }
}
