use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::link::{BusLink, LinkError, SocketConn, SocketFactory};

#[derive(Debug, Default)]
struct BusState {
    replies: VecDeque<Vec<u8>>,
    written: Vec<Vec<u8>>,
    fail_writes: bool,
    fail_reads: bool,
}

/// Cloneable in-memory half-duplex link for tests and simulations.
///
/// Clones share one state, so a test can keep a handle to inspect the
/// traffic after giving another clone to a device.
#[derive(Debug, Clone, Default)]
pub struct SharedBusLink {
    state: Arc<Mutex<BusState>>,
}

impl SharedBusLink {
    fn lock(&self) -> std::sync::MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues bytes to be served by the next read.
    pub fn enqueue_reply(&self, bytes: Vec<u8>) {
        self.lock().replies.push_back(bytes);
    }

    /// Drains and returns all writes captured so far.
    pub fn take_written(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.lock().written)
    }

    /// If enabled, writes fail with a link fault.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// If enabled, reads fail with a link fault.
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }
}

impl BusLink for SharedBusLink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(LinkError::Fault("write disabled"));
        }
        state.written.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, _len: usize) -> Result<Vec<u8>, LinkError> {
        let mut state = self.lock();
        if state.fail_reads {
            return Err(LinkError::Fault("read disabled"));
        }
        Ok(state.replies.pop_front().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct SocketState {
    inbound: Vec<u8>,
    read_pos: usize,
    written: Vec<u8>,
    fail_connect: bool,
    connects: u32,
    open_conns: u32,
}

/// Scripted in-memory socket endpoint for tests.
///
/// Scripted reply bytes form one inbound stream served across
/// connections in order; written bytes accumulate the same way.
#[derive(Debug, Clone, Default)]
pub struct InMemorySocket {
    state: Arc<Mutex<SocketState>>,
}

impl InMemorySocket {
    fn lock(&self) -> std::sync::MutexGuard<'_, SocketState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends bytes to the inbound stream served by `read_exact`.
    pub fn script_reply(&self, bytes: &[u8]) {
        self.lock().inbound.extend_from_slice(bytes);
    }

    /// Drains and returns every byte written so far.
    pub fn take_written(&self) -> Vec<u8> {
        let mut state = self.lock();
        state.written.split_off(0)
    }

    /// If enabled, `connect` fails with a link fault.
    pub fn set_fail_connect(&self, fail: bool) {
        self.lock().fail_connect = fail;
    }

    /// Number of connections opened so far.
    pub fn connect_count(&self) -> u32 {
        self.lock().connects
    }

    /// Number of connections currently open (not yet dropped).
    pub fn open_connections(&self) -> u32 {
        self.lock().open_conns
    }
}

impl SocketFactory for InMemorySocket {
    fn connect(&mut self) -> Result<Box<dyn SocketConn>, LinkError> {
        let mut state = self.lock();
        if state.fail_connect {
            return Err(LinkError::Fault("connect disabled"));
        }
        state.connects += 1;
        state.open_conns += 1;
        Ok(Box::new(InMemorySocketConn {
            state: Arc::clone(&self.state),
        }))
    }
}

struct InMemorySocketConn {
    state: Arc<Mutex<SocketState>>,
}

impl SocketConn for InMemorySocketConn {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.written.extend_from_slice(bytes);
        Ok(())
    }

    fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, LinkError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let available = state.inbound.len() - state.read_pos;
        if available < len {
            return Err(LinkError::ShortRead {
                wanted: len,
                got: available,
            });
        }
        let start = state.read_pos;
        state.read_pos += len;
        Ok(state.inbound[start..start + len].to_vec())
    }
}

impl Drop for InMemorySocketConn {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.open_conns = state.open_conns.saturating_sub(1);
    }
}
