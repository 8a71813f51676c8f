// src/console.rs
//! Terminal plumbing shared by the menu loop, the actions and the background task.
//!
//! Input arrives as [`InputEvent`]s on one channel: a reader thread forwards
//! stdin lines and a signal thread forwards Ctrl-C. Output goes through a
//! cloneable [`Output`] handle that writes each message under a lock, so a
//! notice from the background task never lands in the middle of a menu line.

use crate::error::InputEnd;
use crossterm::style::Stylize;
use signal_hook::consts::SIGINT;
use signal_hook::iterator::Signals;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How often [`Console::wait_for`] looks at the event channel.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Something the console produced for the menu loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// One raw line from stdin, newline included.
    Line(String),
    /// Ctrl-C.
    Interrupt,
    /// stdin is exhausted.
    Eof,
}

/// Serialized writer handle.
#[derive(Clone)]
pub struct Output {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
    styled: bool,
}

impl Output {
    /// Process stdout, colored when it is a terminal.
    pub fn stdout() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(io::stdout()))),
            styled: io::stdout().is_terminal(),
        }
    }

    /// Plain-text output into any writer.
    #[cfg(test)]
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
            styled: false,
        }
    }

    /// Writes `text` without a trailing newline and flushes.
    pub fn write(&self, text: &str) {
        let mut w = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = w.write_all(text.as_bytes()).and_then(|_| w.flush()) {
            tracing::warn!(error = %e, "failed to write console output");
        }
    }

    pub fn line(&self, text: &str) {
        self.write(&format!("{}\n", text));
    }

    /// Writes all lines as one block.
    pub fn lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut block = String::new();
        for line in lines {
            block.push_str(line.as_ref());
            block.push('\n');
        }
        self.write(&block);
    }

    pub fn heading(&self, title: &str) {
        if self.styled {
            self.line(&format!("{}", title.cyan().bold()));
        } else {
            self.line(title);
        }
    }

    /// `ERROR: <message>`, with the tag in red on a terminal.
    pub fn error(&self, message: &str) {
        if self.styled {
            self.line(&format!("{}: {}", "ERROR".red().bold(), message));
        } else {
            self.line(&format!("ERROR: {}", message));
        }
    }
}

/// Line-oriented console fed by an event channel.
pub struct Console {
    events: Receiver<InputEvent>,
    /// Events that arrived while an action was waiting on a worker.
    pending: RefCell<VecDeque<InputEvent>>,
    out: Output,
}

impl Console {
    /// Console over the real terminal: spawns the stdin reader and the
    /// SIGINT listener. Both threads are detached.
    pub fn stdio() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        spawn_interrupt_listener(tx.clone())?;
        spawn_stdin_reader(tx)?;
        Ok(Self::from_channel(rx, Output::stdout()))
    }

    pub fn from_channel(events: Receiver<InputEvent>, out: Output) -> Self {
        Self {
            events,
            pending: RefCell::new(VecDeque::new()),
            out,
        }
    }

    /// Console that replays `events` and then reports end of input.
    #[cfg(test)]
    pub fn from_events(events: impl IntoIterator<Item = InputEvent>, out: Output) -> Self {
        let (tx, rx) = mpsc::channel();
        for event in events {
            // The receiver is alive for the whole loop.
            let _ = tx.send(event);
        }
        Self::from_channel(rx, out)
    }

    /// Console that answers prompts with `lines`, in order.
    #[cfg(test)]
    pub fn scripted<I, S>(lines: I, out: Output) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_events(
            lines
                .into_iter()
                .map(|l| InputEvent::Line(format!("{}\n", l.into()))),
            out,
        )
    }

    pub fn output(&self) -> &Output {
        &self.out
    }

    /// Blocks until the next event. A closed channel counts as end of input.
    pub fn next_event(&self) -> InputEvent {
        if let Some(event) = self.pending.borrow_mut().pop_front() {
            return event;
        }
        self.events.recv().unwrap_or(InputEvent::Eof)
    }

    /// Blocks until `work` delivers a value, returning early on Ctrl-C.
    ///
    /// Lines typed in the meantime are queued for the next read. `Ok(None)`
    /// means the sender hung up without a value.
    pub fn wait_for<T>(&self, work: &Receiver<T>) -> Result<Option<T>, InputEnd> {
        loop {
            match work.recv_timeout(WAIT_POLL) {
                Ok(value) => return Ok(Some(value)),
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
                Err(RecvTimeoutError::Timeout) => {}
            }
            loop {
                match self.events.try_recv() {
                    Ok(InputEvent::Interrupt) => return Err(InputEnd::Interrupted),
                    Ok(event) => self.pending.borrow_mut().push_back(event),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
        }
    }

    /// Prints `prompt` and returns the next line, trimmed.
    pub fn read_line(&self, prompt: &str) -> Result<String, InputEnd> {
        self.out.write(prompt);
        match self.next_event() {
            InputEvent::Line(line) => Ok(line.trim().to_string()),
            InputEvent::Interrupt => Err(InputEnd::Interrupted),
            InputEvent::Eof => Err(InputEnd::Closed),
        }
    }

    /// Prompts for a value, falling back to `default` on an empty answer.
    pub fn prompt_input(&self, prompt: &str, default: &str) -> Result<String, InputEnd> {
        let label = if default.is_empty() {
            format!("{}: ", prompt)
        } else {
            format!("{} [default: {}]: ", prompt, default)
        };
        let value = self.read_line(&label)?;
        if value.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(value)
        }
    }
}

fn spawn_stdin_reader(tx: Sender<InputEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = io::stdin();
            loop {
                let mut line = String::new();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) => {
                        let _ = tx.send(InputEvent::Eof);
                        break;
                    }
                    Ok(_) => {
                        if tx.send(InputEvent::Line(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed; treating as end of input");
                        let _ = tx.send(InputEvent::Eof);
                        break;
                    }
                }
            }
        })?;
    Ok(())
}

fn spawn_interrupt_listener(tx: Sender<InputEvent>) -> io::Result<()> {
    let mut signals = Signals::new([SIGINT])?;
    thread::Builder::new()
        .name("sigint-listener".into())
        .spawn(move || {
            for _ in signals.forever() {
                if tx.send(InputEvent::Interrupt).is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}

#[cfg(test)]
pub mod testing {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// In-memory writer whose contents can be read back after the fact.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
