pub mod data;

use crate::devices::{Esp32, Esp32Error};
use csv::{Terminator, Writer, WriterBuilder};
use data::{Record, HEADER};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Decode error: {0}")]
    DecodeError(#[from] std::str::Utf8Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Device error: {0}")]
    DeviceError(#[from] Esp32Error),

    #[error("Failed to install interrupt handler: {0}")]
    SignalError(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Fixed settings for a logging session
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub host: String,            // ESP32 access point address
    pub port: u16,               // ESP32 TCP port
    pub log_path: PathBuf,       // CSV log, appended to
    pub recv_buffer_size: usize, // Max bytes taken per receive
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.4.1".to_string(),
            port: 80,
            log_path: PathBuf::from("log.csv"),
            recv_buffer_size: 1024,
        }
    }
}

/// Append-only CSV destination. Rows may differ in width.
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
}

impl CsvSink<File> {
    pub fn open_append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!("Opened {} for appending", path.display());
        Ok(Self::new(file))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .terminator(Terminator::CRLF)
            .from_writer(inner);
        CsvSink { writer }
    }

    /// Written at the start of every run, even if the file already has rows.
    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_record(HEADER)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Each row reaches the OS before this returns.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        self.writer.write_record(record.fields())?;
        self.writer.flush()?;
        Ok(())
    }

    #[cfg(test)]
    fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }
}

/// Receive loop. Runs until `stop` is set; returns the number of rows
/// appended.
///
/// An empty read is not treated as end of stream, the loop just polls
/// again. Decode and write failures end the loop with an error.
pub fn run<R: Read, W: Write>(
    source: &mut R,
    sink: &mut CsvSink<W>,
    stop: &AtomicBool,
    recv_buffer_size: usize,
) -> Result<u64> {
    let mut buf = vec![0_u8; recv_buffer_size];
    let mut rows = 0;

    while !stop.load(Ordering::SeqCst) {
        let n = match source.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if stop.load(Ordering::SeqCst) => {
                debug!("Read failed after stop was requested: {}", e);
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            continue;
        }

        let reading = data::decode(&buf[..n])?;
        let record = Record::new(data::timestamp_now(), reading.clone());
        println!("[{}] Received: {}", record.timestamp, reading.message);

        sink.append(&record)?;
        rows += 1;
    }

    Ok(rows)
}

/// Opens the log, connects to the device and logs until Ctrl-C.
pub fn start(config: LoggerConfig) -> Result<u64> {
    info!("Starting logging session with configuration: {:?}", config);

    let mut sink = CsvSink::open_append(&config.log_path)?;
    sink.write_header()?;

    let mut esp = Esp32::new(&config.host, config.port);
    esp.connect()?;
    println!("Connected to ESP32");

    let stop = Arc::new(AtomicBool::new(false));
    let handle = esp.shutdown_handle()?;
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
            handle.shutdown();
        })?;
    }

    let rows = run(&mut esp, &mut sink, &stop, config.recv_buffer_size).map_err(|e| {
        error!("Logging session aborted: {}", e);
        e
    })?;

    println!("Logging stopped by user.");
    info!("Logging stopped by user after {} rows", rows);
    Ok(rows)
}
