//! Output sinks for the per-skip diagnostic lines.
//!
//! The pipeline never prints directly; it emits through an [`OutputSink`] so
//! callers can capture, discard, or forward the lines.

/// Receives one line of diagnostic output at a time.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// Writes each line to stdout. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str) {}
}

/// Collects output into a String for testing or programmatic capture.
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    pub buffer: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn lines(&self) -> Vec<&str> {
        self.buffer.lines().collect()
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(text);
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn emit(&mut self, text: &str) {
        (**self).emit(text)
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn emit(&mut self, text: &str) {
        (**self).emit(text)
    }
}
