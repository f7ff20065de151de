// Copyright 2024 Wladimir Palant
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Destinations for log lines

use log::error;
use std::fmt;
use std::fs::File;
use std::io::{self, stdout, Stdout, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// A destination for log lines
///
/// Lines of concurrent requests can arrive at the same time. Implementations have to make sure
/// that each line is written as a whole, without being interleaved with other lines.
pub trait LogSink: Send + Sync + fmt::Debug {
    /// Writes a line followed by a newline character and flushes the output if possible
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Opens a log file for appending. `-` stands for standard output, failure to open the file
/// results in standard output being used as well.
pub fn open_writer(path: &Path) -> Box<dyn Write + Send> {
    if path.as_os_str() != "-" {
        match File::options().append(true).create(true).open(path) {
            Ok(file) => return Box::new(file),
            Err(err) => {
                error!(
                    "Failed opening log file {} (cause: {err}), falling back to stdout",
                    path.as_os_str().to_string_lossy()
                );
            }
        }
    }
    Box::new(stdout())
}

fn terminate_line(buf: &mut Vec<u8>, line: &str) {
    buf.truncate(0);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
}

/// A sink writing lines synchronously, a lock serializes concurrent writes
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink").finish_non_exhaustive()
    }
}

impl<W: Write + Send> WriterSink<W> {
    /// Creates a sink writing to the given writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl WriterSink<Stdout> {
    /// Creates a sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(stdout())
    }
}

impl WriterSink<Box<dyn Write + Send>> {
    /// Creates a sink appending to a file, see [`open_writer`]
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::new(open_writer(path.as_ref()))
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        terminate_line(&mut buf, line);

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&buf)?;
        writer.flush()
    }
}

async fn log_writer<W: Write>(mut receiver: UnboundedReceiver<String>, mut writer: W) {
    let mut buf = Vec::<u8>::with_capacity(4096);

    while let Some(line) = receiver.recv().await {
        terminate_line(&mut buf, &line);
        if let Err(err) = writer.write_all(&buf).and_then(|()| writer.flush()) {
            error!("Failed writing access log line: {err}");
        }
    }
}

/// A sink handing lines over to a background task which writes them in order
///
/// Writing a line never blocks the request. The sink has to be created within a Tokio runtime.
#[derive(Debug)]
pub struct QueueSink {
    sender: UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl QueueSink {
    /// Spawns the writer task and creates a sink feeding it
    pub fn spawn<W: Write + Send + 'static>(writer: W) -> Self {
        let (sender, receiver) = unbounded_channel();
        let task = tokio::spawn(async move { log_writer(receiver, writer).await });
        Self { sender, task }
    }

    /// Waits until all queued lines have been written
    pub async fn close(self) {
        let Self { sender, task } = self;
        drop(sender);
        if let Err(err) = task.await {
            error!("Log writer task failed: {err}");
        }
    }
}

impl LogSink for QueueSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.sender.send(line.to_owned()).map_err(|err| {
            io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("log writer task is gone, thread crashed? {err}"),
            )
        })
    }
}
