use std::{
    fmt::Display,
    io::{self, Stderr, Stdout, Write},
};

/// Writes progress and document output to one stream and diagnostics to
/// another, making sure anything already printed to the first shows up
/// before a diagnostic does.
pub struct StdioPrinter<O: Write, E: Write> {
    stdout: O,
    stderr: E,
}

impl StdioPrinter<Stdout, Stderr> {
    pub fn new() -> Self {
        StdioPrinter::with_streams(io::stdout(), io::stderr())
    }
}

impl Default for StdioPrinter<Stdout, Stderr> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write, E: Write> StdioPrinter<O, E> {
    pub fn with_streams(stdout: O, stderr: E) -> Self {
        StdioPrinter { stdout, stderr }
    }

    /// Print the given value to stdout, followed by a newline.
    pub fn println<T: Display>(&mut self, value: T) -> io::Result<()> {
        writeln!(self.stdout, "{value}")
    }

    /// Flush stdout, then write the given value to stderr followed by a
    /// newline.
    pub fn eprintln<T: Display>(&mut self, value: T) -> io::Result<()> {
        let _ = self.stdout.flush();
        writeln!(self.stderr, "{value}")?;
        self.stderr.flush()
    }

    pub fn streams(&mut self) -> (&mut dyn Write, &mut dyn Write) {
        (&mut self.stdout, &mut self.stderr)
    }

    pub fn stderr(&mut self) -> &mut dyn Write {
        &mut self.stderr
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()?;
        self.stderr.flush()
    }

    #[cfg(test)]
    pub fn into_streams(self) -> (O, E) {
        (self.stdout, self.stderr)
    }
}
