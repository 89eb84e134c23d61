//! Internal implementation for scoring module
//!
//! Spawns the scorer, forwards both output pipes line by line through one
//! channel, and enforces a deadline on the whole run.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Result, SweepError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What a finished scorer run left behind
#[derive(Debug)]
pub struct RunOutput {
    pub status: ExitStatus,
    /// Combined stdout/stderr, in arrival order
    pub output: String,
}

pub fn run(program: &str, args: &[String], experiment: &str, timeout: Duration) -> Result<RunOutput> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SweepError::io(program, e))?;

    let deadline = Instant::now() + timeout;
    let (tx, rx) = mpsc::channel::<String>();

    let mut pipes: Vec<Box<dyn Read + Send>> = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        pipes.push(Box::new(stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        pipes.push(Box::new(stderr));
    }

    let readers: Vec<_> = pipes
        .into_iter()
        .map(|pipe| {
            let tx = tx.clone();
            thread::spawn(move || forward_lines(pipe, &tx))
        })
        .collect();
    drop(tx);

    let mut output = String::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(line) => {
                tracing::info!(target: "fbsweep::scorer", experiment, "{}", line);
                output.push_str(&line);
                output.push('\n');
            }
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                kill(&mut child);
                return Err(timed_out(program, timeout));
            }
        }
    }

    for reader in readers {
        let _ = reader.join();
    }

    // Pipes are closed, but the process may still be running
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                kill(&mut child);
                return Err(timed_out(program, timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(SweepError::io(program, e)),
        }
    };

    Ok(RunOutput { status, output })
}

/// Drain `pipe` until EOF, one lossily decoded line per message. Stops
/// early only once nobody is receiving.
fn forward_lines(pipe: Box<dyn Read + Send>, tx: &mpsc::Sender<String>) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(target: "fbsweep::scorer", error = %e, "stopped reading scorer output");
                break;
            }
        }
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn timed_out(program: &str, after: Duration) -> SweepError {
    SweepError::Timeout {
        operation: format!("scoring program {}", program),
        after,
    }
}
