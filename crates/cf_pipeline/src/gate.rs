use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::{Arc, Mutex};
use cf_core::{preview, Error, HumanGate, Result, Role};

/// Line that closes a multi-line edit.
pub const END_MARKER: &str = "END";

/// Operator prompts on a line-oriented reader/writer pair (normally the terminal).
pub struct ConsoleGate<R, W> {
    reader: R,
    writer: W,
    preview_chars: usize,
}

impl ConsoleGate<BufReader<Stdin>, Stdout> {
    pub fn stdio(preview_chars: usize) -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout(), preview_chars)
    }
}

impl<R: BufRead, W: Write> ConsoleGate<R, W> {
    pub fn new(reader: R, writer: W, preview_chars: usize) -> Self {
        Self {
            reader,
            writer,
            preview_chars,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(Error::Input("operator input closed".to_string()));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    fn prompt(&mut self, question: &str) -> Result<String> {
        write!(self.writer, "{}", question)?;
        self.writer.flush()?;
        self.read_line()
    }
}

impl<R: BufRead + Send, W: Write + Send> HumanGate for ConsoleGate<R, W> {
    fn request_edit(&mut self, text: &str, role: Role) -> Result<String> {
        writeln!(self.writer, "\n--- {} Iteration ---", role)?;
        writeln!(self.writer, "Current Text:\n{}\n", preview(text, self.preview_chars))?;

        let answer = self.prompt("Edit text? (y/n): ")?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            return Ok(text.to_string());
        }

        writeln!(
            self.writer,
            "Enter your edits (end input with a single line containing only '{}'):",
            END_MARKER
        )?;
        self.writer.flush()?;

        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            if line.trim() == END_MARKER {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    fn request_query(&mut self) -> Result<String> {
        self.prompt("Enter search query to retrieve version: ")
    }

    fn present(&mut self, heading: &str, text: &str) -> Result<()> {
        writeln!(self.writer, "\n[{}]:\n{}\n", heading, text)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Accepts every stage unchanged and answers queries with a fixed string.
#[derive(Debug, Clone, Default)]
pub struct AcceptAll {
    query: String,
}

impl AcceptAll {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }
}

impl HumanGate for AcceptAll {
    fn request_edit(&mut self, text: &str, role: Role) -> Result<String> {
        tracing::debug!("Accepting {} stage unchanged", role);
        Ok(text.to_string())
    }

    fn request_query(&mut self) -> Result<String> {
        Ok(self.query.clone())
    }
}

/// One interaction recorded by [`ScriptedGate`].
#[derive(Debug, Clone, PartialEq)]
pub enum GateEvent {
    Edit { role: Role, text: String },
    Present { heading: String, text: String },
    Query(String),
}

/// Handle on a gate's event history, kept by the caller after the gate is boxed.
pub type GateLog = Arc<Mutex<Vec<GateEvent>>>;

/// Replays prepared operator answers in order. `None` means "accept as-is".
#[derive(Debug, Clone, Default)]
pub struct ScriptedGate {
    edits: VecDeque<Option<String>>,
    queries: VecDeque<String>,
    log: GateLog,
}

impl ScriptedGate {
    pub fn new<I, Q>(edits: I, queries: Q) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
        Q: IntoIterator<Item = String>,
    {
        Self {
            edits: edits.into_iter().collect(),
            queries: queries.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn log(&self) -> GateLog {
        Arc::clone(&self.log)
    }

    fn record(&self, event: GateEvent) {
        // A poisoned log still holds every event pushed before the panic
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}

impl HumanGate for ScriptedGate {
    fn request_edit(&mut self, text: &str, role: Role) -> Result<String> {
        self.record(GateEvent::Edit {
            role,
            text: text.to_string(),
        });
        let edit = self
            .edits
            .pop_front()
            .ok_or_else(|| Error::Input(format!("no scripted answer for {}", role)))?;
        Ok(edit.unwrap_or_else(|| text.to_string()))
    }

    fn request_query(&mut self) -> Result<String> {
        let query = self
            .queries
            .pop_front()
            .ok_or_else(|| Error::Input("no scripted query".to_string()))?;
        self.record(GateEvent::Query(query.clone()));
        Ok(query)
    }

    fn present(&mut self, heading: &str, text: &str) -> Result<()> {
        self.record(GateEvent::Present {
            heading: heading.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}
