//! Log capture for testing
//!
//! Installs a thread-local `tracing` subscriber that writes plain text into a
//! buffer, so tests can assert on what was logged and what was not.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    let mut inner = self.0.lock().map_err(|_| io::Error::other("log buffer poisoned"))?;
    inner.extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
  type Writer = SharedBuffer;

  fn make_writer(&'a self) -> Self::Writer {
    self.clone()
  }
}

/// Captures everything logged on the current thread until dropped
///
/// Works with `#[tokio::test]`, which runs on a single thread by default.
pub struct LogCapture {
  buffer: SharedBuffer,
  _guard: DefaultGuard,
}

impl LogCapture {
  /// Start capturing at TRACE level
  pub fn start() -> Self {
    let buffer = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
      .with_writer(buffer.clone())
      .with_ansi(false)
      .with_max_level(Level::TRACE)
      .finish();
    let guard = tracing::subscriber::set_default(subscriber);

    Self { buffer, _guard: guard }
  }

  /// Everything captured so far
  pub fn output(&self) -> String {
    let inner = self.buffer.0.lock().expect("log buffer poisoned");
    String::from_utf8_lossy(&inner).into_owned()
  }

  /// Whether the captured output contains `needle`
  pub fn contains(&self, needle: &str) -> bool {
    self.output().contains(needle)
  }
}
