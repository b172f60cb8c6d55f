//! REPL and script runner on top of [`SessionExecutor`].

use crate::backend::Backend;
use crate::executor::SessionExecutor;
use std::error::Error;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

pub struct ReplOptions<'a> {
    pub banner_lines: &'a [&'a str],
    pub prompt: &'a str,
    pub exit_commands: &'a [&'a str],
    pub handle_ctrl_c: bool,
}

pub struct Session<'a, B: Backend + ?Sized> {
    pub backend: &'a mut B,
    pub executor: &'a mut SessionExecutor,
    pub output: OutputHandlers,
}

impl<B: Backend + ?Sized> Session<'_, B> {
    /// Run one line, reporting its output or error. Returns whether it
    /// succeeded.
    pub async fn run_line(&mut self, line: &str) -> bool {
        match self.executor.execute_line(&mut *self.backend, line).await {
            Ok(result) => {
                (self.output.out)(&result.output);
                result.success
            }
            Err(e) => {
                (self.output.err)(&format!("Error: {}", e));
                false
            }
        }
    }

    /// Execute a script: one command per line, `#` starts a comment line.
    pub async fn run_file(&mut self, path: &str, stop_on_error: bool) -> Result<(), Box<dyn Error>> {
        let content = tokio::fs::read_to_string(path).await?;
        for (number, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if !self.run_line(trimmed).await && stop_on_error {
                let msg = format!("{}:{}: '{}' failed", path, number + 1, trimmed);
                return Err(io::Error::other(msg).into());
            }
        }
        Ok(())
    }

    pub async fn run_repl(&mut self, options: ReplOptions<'_>) -> Result<(), Box<dyn Error>> {
        for line in options.banner_lines {
            (self.output.out)(line);
        }

        let mut reader = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = io::stdout();

        loop {
            print!("{}", options.prompt);
            stdout.flush()?;

            let next = if options.handle_ctrl_c {
                tokio::select! {
                    line = reader.next_line() => line,
                    _ = tokio::signal::ctrl_c() => Ok(None),
                }
            } else {
                reader.next_line().await
            };

            match classify_line(next, options.exit_commands) {
                ReadLine::Input(line) => {
                    self.run_line(&line).await;
                }
                ReadLine::Skip => continue,
                ReadLine::Exit => break,
                ReadLine::Error(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

enum ReadLine {
    Input(String),
    Skip,
    /// EOF, Ctrl-C or an exit command.
    Exit,
    Error(io::Error),
}

fn classify_line(result: io::Result<Option<String>>, exit_commands: &[&str]) -> ReadLine {
    match result {
        Ok(Some(input)) => {
            let trimmed = input.trim();
            if trimmed.is_empty() {
                ReadLine::Skip
            } else if exit_commands.contains(&trimmed) {
                ReadLine::Exit
            } else {
                ReadLine::Input(trimmed.to_string())
            }
        }
        Ok(None) => ReadLine::Exit,
        Err(e) => ReadLine::Error(e),
    }
}
