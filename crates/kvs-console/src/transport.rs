//! Transport collaborator
//!
//! Saving hands a [`WireRequest`] to a transport; the device confirms later,
//! either through [`SettingsConsole::confirm_saved`](crate::SettingsConsole::confirm_saved)
//! or a remote `saved` key.

use std::io::Write;

use kvs_patch::WireRequest;

use crate::error::TransportError;

/// Sends patches to the device
pub trait Transport {
    /// Send one request
    ///
    /// # Errors
    ///
    /// Any failure to hand the request over.
    fn send_patch(&mut self, request: &WireRequest) -> Result<(), TransportError>;
}

/// Transport writing each request as one JSON line
#[derive(Debug)]
pub struct WriterTransport<W> {
    writer: W,
}

impl<W: Write> WriterTransport<W> {
    /// Wrap a writer
    #[inline]
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the writer
    #[inline]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn send_patch(&mut self, request: &WireRequest) -> Result<(), TransportError> {
        let line = request
            .to_json()
            .map_err(|e| TransportError::new(format!("serialize: {e}")))?;
        writeln!(self.writer, "{line}").map_err(|e| TransportError::new(format!("write: {e}")))?;
        self.writer
            .flush()
            .map_err(|e| TransportError::new(format!("flush: {e}")))
    }
}
