use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use gcode::Program;

/// Where line text is transmitted to.
pub trait LineSink {
    fn send(&mut self, line: &str) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Sends each line, newline-terminated, to a writer.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink { writer }
    }
}

impl<W: Write> LineSink for WriterSink<W> {
    fn send(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Read the whole input. `-` means standard input.
/// Returns the display name along with the text.
pub fn read_input(path: &str) -> io::Result<(String, String)> {
    if path == "-" {
        let mut source = String::new();
        io::stdin().lock().read_to_string(&mut source)?;
        Ok(("<stdin>".to_string(), source))
    } else {
        Ok((path.to_string(), std::fs::read_to_string(path)?))
    }
}

/// Open the transmit target: a file, stdout, or nothing at all in quiet mode.
pub fn open_sink(output: Option<&Path>, quiet: bool) -> io::Result<Box<dyn LineSink>> {
    if quiet {
        return Ok(Box::new(WriterSink::new(io::sink())));
    }
    match output {
        Some(path) => Ok(Box::new(WriterSink::new(BufWriter::new(File::create(path)?)))),
        None => Ok(Box::new(WriterSink::new(io::stdout().lock()))),
    }
}

/// Owns the transmit side of a dump. The sink is flushed when the session
/// is dropped, whichever way the dump ends.
pub struct Session {
    name: String,
    sink: Box<dyn LineSink>,
    sent: usize,
}

impl Session {
    pub fn new(name: String, sink: Box<dyn LineSink>) -> Self {
        log::info!("session opened for {}", name);
        Session {
            name,
            sink,
            sent: 0,
        }
    }

    /// Send every non-blank line of `program`: the raw text, or the
    /// normalized block when `strip` is set. Returns the number of lines sent.
    pub fn transmit(&mut self, program: &Program, strip: bool) -> io::Result<usize> {
        for line in &program.lines {
            let Some(block) = &line.block else {
                continue;
            };
            if strip {
                self.sink.send(&block.to_string())?;
            } else {
                self.sink.send(&line.text)?;
            }
            self.sent += 1;
        }
        self.sink.flush()?;
        Ok(self.sent)
    }

    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.sink.flush() {
            log::warn!("flushing output for {} failed: {}", self.name, e);
        }
        log::info!("session closed for {}, {} lines sent", self.name, self.sent);
    }
}
