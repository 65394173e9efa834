//! Write-side buffer engine.
//!
//! Small variable-size appends are accumulated into a fixed-capacity block. When
//! the block runs low on room, it is handed to a background flush task and a
//! standby block takes its place, so filling and transmission overlap. At most one
//! flush is in flight per writer; starting a second one first joins the first, so
//! a block is never filled while it is still being written out.
//!
//! ```text
//!   append ──> [ active ] ──swap──> flush task ──> sink
//!              [standby ] <──────── (returned on completion)
//! ```

use std::io::Write;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::error::{GraphcodeError, Result};
use crate::format::{MAX_SCALAR_WIDTH, MIN_BLOCK_SIZE};

/// Threads in the shared flush pool.
const FLUSH_THREADS: usize = 4;

/// The pool that runs pipelined flushes.
///
/// It only ever runs flush tasks, never caller code, so a flush cannot end up
/// queued behind the rayon worker that is waiting for it. `None` if the pool
/// could not be built; writers then flush inline.
fn flush_pool() -> Option<&'static rayon::ThreadPool> {
    static POOL: OnceLock<Option<rayon::ThreadPool>> = OnceLock::new();
    POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(FLUSH_THREADS)
            .thread_name(|i| format!("graphcode-flush-{i}"))
            .build()
            .map_err(|e| tracing::warn!(error = %e, "flush pool unavailable; flushing inline"))
            .ok()
    })
    .as_ref()
}

/// Lifecycle of a [`BlockWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    /// Accepting appends, no flush in flight.
    Filling,
    /// Accepting appends while a previous block is being written to the sink.
    Flushing,
    /// Finalized; no further appends are accepted.
    Idle,
}

/// A double-buffered writer that pipelines block flushes with new appends.
///
/// All mutation goes through a single mutex that guards the active block, its
/// cursor and the flush bookkeeping. The lock makes the swap atomic with respect
/// to concurrent appends; it does not make concurrent appends useful.
#[derive(Debug)]
pub struct BlockWriter<W: Write + Send + 'static> {
    inner: Mutex<WriterState<W>>,
    block_size: usize,
    pipelined: bool,
}

#[derive(Debug)]
struct WriterState<W> {
    active: Vec<u8>,
    /// `None` while the standby block is owned by the flush task.
    standby: Option<Vec<u8>>,
    /// `None` while the sink is owned by the flush task.
    sink: Option<W>,
    pending: Option<Receiver<FlushOutcome<W>>>,
    phase: WritePhase,
    /// First sink failure. The sink is considered compromised afterwards.
    failure: Option<GraphcodeError>,
    bytes_flushed: u64,
    /// Size of the block currently owned by the flush task.
    in_flight: usize,
}

/// What a flush task hands back: ownership of the sink and the drained block.
#[derive(Debug)]
struct FlushOutcome<W> {
    sink: W,
    block: Vec<u8>,
    written: usize,
    result: std::io::Result<()>,
}

fn run_flush<W: Write>(mut sink: W, mut block: Vec<u8>) -> FlushOutcome<W> {
    let result = sink.write_all(&block);
    let written = block.len();
    block.clear();
    FlushOutcome {
        sink,
        block,
        written,
        result,
    }
}

impl<W: Write + Send + 'static> BlockWriter<W> {
    /// Creates a writer with `block_size` bytes per block (clamped to [`MIN_BLOCK_SIZE`]).
    ///
    /// With `pipelined` set, full blocks are flushed on a dedicated rayon pool
    /// while the caller keeps filling the standby block; otherwise flushes run
    /// inline.
    pub fn new(sink: W, block_size: usize, pipelined: bool) -> Self {
        let block_size = block_size.max(MIN_BLOCK_SIZE);
        Self {
            inner: Mutex::new(WriterState {
                active: Vec::with_capacity(block_size),
                standby: Some(Vec::with_capacity(block_size)),
                sink: Some(sink),
                pending: None,
                phase: WritePhase::Filling,
                failure: None,
                bytes_flushed: 0,
                in_flight: 0,
            }),
            block_size,
            pipelined,
        }
    }

    /// The capacity of each block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn lock(&self) -> Result<MutexGuard<'_, WriterState<W>>> {
        self.inner
            .lock()
            .map_err(|_| GraphcodeError::Internal("BlockWriter mutex poisoned".into()))
    }

    /// Appends bytes to the active block, rotating blocks as they fill up.
    ///
    /// Only blocks when a rotation has to wait for the previous flush.
    pub fn append(&self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock()?;
        state.check_open()?;

        let mut rest = bytes;
        while !rest.is_empty() {
            let room = self.block_size - state.active.len();
            let take = room.min(rest.len());
            let (head, tail) = rest.split_at(take);
            state.active.extend_from_slice(head);
            rest = tail;

            if self.block_size - state.active.len() < MAX_SCALAR_WIDTH {
                self.rotate(&mut state)?;
            }
        }
        Ok(())
    }

    /// Flushes the partial active block and waits until every byte reached the sink.
    pub fn force_flush(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.check_open()?;
        self.drain(&mut state)
    }

    /// Flushes everything, waits for completion and returns the sink.
    pub fn finish(self) -> Result<W> {
        let sink = {
            let mut state = self.lock()?;
            state.check_open()?;
            self.drain(&mut state)?;
            state.phase = WritePhase::Idle;
            tracing::debug!(bytes = state.bytes_flushed, "block writer finished");
            state.sink.take()
        };
        sink.ok_or_else(|| GraphcodeError::Internal("sink not returned by flush task".into()))
    }

    /// Current phase, polling the in-flight flush for completion.
    pub fn phase(&self) -> Result<WritePhase> {
        let mut state = self.lock()?;
        if let Some(done) = state.pending.as_ref()
            && let Ok(outcome) = done.try_recv()
        {
            state.pending = None;
            state.absorb(outcome)?;
        }
        Ok(state.phase)
    }

    /// Total bytes appended so far (flushed or still buffered).
    pub fn position(&self) -> Result<u64> {
        let state = self.lock()?;
        Ok(state.bytes_flushed + state.pending_len() + state.active.len() as u64)
    }

    /// Rotates a non-empty active block out for flushing.
    fn rotate(&self, state: &mut WriterState<W>) -> Result<()> {
        if state.active.is_empty() {
            return Ok(());
        }
        state.await_pending()?;

        let standby = state
            .standby
            .take()
            .unwrap_or_else(|| Vec::with_capacity(self.block_size));
        let block = std::mem::replace(&mut state.active, standby);
        let sink = state
            .sink
            .take()
            .ok_or_else(|| GraphcodeError::Internal("sink missing during rotation".into()))?;

        tracing::trace!(bytes = block.len(), pipelined = self.pipelined, "flushing block");

        match flush_pool().filter(|_| self.pipelined) {
            Some(pool) => {
                let (tx, rx) = mpsc::sync_channel(1);
                state.in_flight = block.len();
                pool.spawn(move || {
                    // The receiver only disappears if the writer was torn down mid-flush.
                    let _ = tx.send(run_flush(sink, block));
                });
                state.pending = Some(rx);
                state.phase = WritePhase::Flushing;
                Ok(())
            }
            None => state.absorb(run_flush(sink, block)),
        }
    }

    /// Flushes the partial block, joins the flush and flushes the sink itself.
    fn drain(&self, state: &mut WriterState<W>) -> Result<()> {
        self.rotate(state)?;
        state.await_pending()?;
        let sink = state
            .sink
            .as_mut()
            .ok_or_else(|| GraphcodeError::Internal("sink missing after flush".into()))?;
        if let Err(e) = sink.flush() {
            let err = GraphcodeError::from(e);
            state.failure = Some(err.clone());
            return Err(err);
        }
        Ok(())
    }
}

impl<W> WriterState<W> {
    fn check_open(&self) -> Result<()> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.phase == WritePhase::Idle {
            return Err(GraphcodeError::Internal("write after finish".into()));
        }
        Ok(())
    }

    fn pending_len(&self) -> u64 {
        if self.pending.is_some() {
            self.in_flight as u64
        } else {
            0
        }
    }

    /// Joins the in-flight flush, if any.
    fn await_pending(&mut self) -> Result<()> {
        if let Some(done) = self.pending.take() {
            let outcome = done
                .recv()
                .map_err(|_| GraphcodeError::Internal("flush task vanished".into()))?;
            self.absorb(outcome)?;
        }
        Ok(())
    }

    /// Takes back ownership of the sink and the drained block.
    fn absorb(&mut self, outcome: FlushOutcome<W>) -> Result<()> {
        self.sink = Some(outcome.sink);
        self.standby = Some(outcome.block);
        self.in_flight = 0;
        if self.phase == WritePhase::Flushing {
            self.phase = WritePhase::Filling;
        }
        match outcome.result {
            Ok(()) => {
                self.bytes_flushed += outcome.written as u64;
                Ok(())
            }
            Err(e) => {
                let err = GraphcodeError::from(e);
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }
}

impl<W: Write + Send + 'static> Drop for BlockWriter<W> {
    fn drop(&mut self) {
        let state = match self.inner.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.phase == WritePhase::Idle || state.failure.is_some() {
            return;
        }
        // Inline flush: no point pipelining the last block of a dying writer.
        let result = state.await_pending().and_then(|()| {
            if state.active.is_empty() {
                return Ok(());
            }
            let block = std::mem::take(&mut state.active);
            match state.sink.take() {
                Some(sink) => state.absorb(run_flush(sink, block)),
                None => Ok(()),
            }
        });
        let result = result.and_then(|()| match state.sink.as_mut() {
            Some(sink) => sink.flush().map_err(GraphcodeError::from),
            None => Ok(()),
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "block writer dropped without finish; final flush failed");
        }
        state.phase = WritePhase::Idle;
    }
}
