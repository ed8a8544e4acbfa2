use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU8, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};

use super::{
    mailbox::{LatestReceiver, LatestSender, latest_channel},
    session::{EditorSession, SessionEvent},
    slot::EditorSlot,
};

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EditorState {
    Closed = 0,
    Opening = 1,
    Open = 2,
    Closing = 3,
}

impl EditorState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => EditorState::Opening,
            2 => EditorState::Open,
            3 => EditorState::Closing,
            _ => EditorState::Closed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// This bridge already runs an editor; nothing changed.
    AlreadyOpen,
    /// Another bridge holds the editor slot; nothing changed.
    Busy,
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    stop: AtomicBool,
}

impl Shared {
    fn set(&self, s: EditorState) {
        self.state.store(s as u8, Ordering::Release);
    }
}

/// Main-thread handle to at most one background editing session.
///
/// The main thread is the only writer of the input graph and the only reader
/// of edited output; the background thread is the reverse. Both directions
/// are single-slot and keep only the newest graph.
pub struct EditorBridge {
    slot: EditorSlot,
    poll_period: Duration,
    shared: Arc<Shared>,
    input: Option<LatestSender<String>>,
    output: Option<LatestReceiver<String>>,
    pending: Option<String>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EditorBridge {
    pub fn new(slot: EditorSlot, poll_period: Duration) -> Self {
        Self {
            slot,
            poll_period,
            shared: Arc::new(Shared {
                state: AtomicU8::new(EditorState::Closed as u8),
                stop: AtomicBool::new(false),
            }),
            input: None,
            output: None,
            pending: None,
            worker: None,
        }
    }

    /// Bridge guarded by the process-wide editor slot.
    pub fn global(poll_period: Duration) -> Self {
        Self::new(EditorSlot::global(), poll_period)
    }

    pub fn state(&self) -> EditorState {
        EditorState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Start `session` on a background thread with `initial` loaded.
    pub fn open(&mut self, session: Box<dyn EditorSession>, initial: &str) -> Result<OpenOutcome> {
        self.refresh();
        if self.worker.is_some() {
            return Ok(OpenOutcome::AlreadyOpen);
        }
        if !self.slot.try_acquire() {
            log::info!("[editor] another editor is open; ignoring open request");
            return Ok(OpenOutcome::Busy);
        }

        let (input_tx, input_rx) = latest_channel::<String>();
        let (output_tx, output_rx) = latest_channel::<String>();
        self.shared.stop.store(false, Ordering::Release);
        self.shared.set(EditorState::Opening);

        let shared = self.shared.clone();
        let period = self.poll_period;
        let initial = initial.to_string();
        let spawned = thread::Builder::new()
            .name("graph-editor".to_string())
            .spawn(move || run_session(session, &initial, input_rx, output_tx, &shared, period))
            .context("failed to spawn editor thread");

        let worker = match spawned {
            Ok(w) => w,
            Err(e) => {
                self.shared.set(EditorState::Closed);
                self.slot.release();
                return Err(e);
            }
        };

        self.input = Some(input_tx);
        self.output = Some(output_rx);
        self.worker = Some(worker);
        Ok(OpenOutcome::Opened)
    }

    /// Hand a newer graph to the running editor. `false` when no editor runs.
    pub fn push_graph(&self, graph: impl Into<String>) -> bool {
        match &self.input {
            Some(tx) if self.worker.is_some() => {
                tx.send(graph.into());
                true
            }
            _ => false,
        }
    }

    /// Newest edited graph not yet taken. Survives the editor closing.
    pub fn take_edited(&mut self) -> Option<String> {
        self.stash_output();
        self.pending.take()
    }

    /// Ask the background thread to stop. Observed within one poll period.
    pub fn request_close(&self) {
        self.shared.stop.store(true, Ordering::Release);
        let _ = self.shared.state.compare_exchange(
            EditorState::Open as u8,
            EditorState::Closing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Reap a finished background thread. Never blocks on a running one.
    pub fn refresh(&mut self) -> EditorState {
        if self.worker.as_ref().is_some_and(|w| w.is_finished()) {
            self.join_worker();
        }
        self.state()
    }

    /// Stop the editor and wait for its thread.
    pub fn close_and_wait(&mut self) {
        if self.worker.is_none() {
            return;
        }
        self.request_close();
        self.join_worker();
    }

    fn stash_output(&mut self) {
        if let Some(g) = self.output.as_ref().and_then(|rx| rx.take()) {
            self.pending = Some(g);
        }
    }

    fn join_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.join().is_err() {
            log::warn!("[editor] editor thread panicked");
        }
        self.stash_output();
        self.input = None;
        self.output = None;
        self.shared.set(EditorState::Closed);
        self.slot.release();
        log::debug!("[editor] closed");
    }
}

impl Drop for EditorBridge {
    fn drop(&mut self) {
        self.close_and_wait();
    }
}

fn run_session(
    mut session: Box<dyn EditorSession>,
    initial: &str,
    input: LatestReceiver<String>,
    output: LatestSender<String>,
    shared: &Shared,
    period: Duration,
) {
    if let Err(e) = session.open(initial) {
        log::warn!("[editor] failed to open session: {e:#}");
        shared.set(EditorState::Closing);
        return;
    }
    let _ = shared.state.compare_exchange(
        EditorState::Opening as u8,
        EditorState::Open as u8,
        Ordering::AcqRel,
        Ordering::Acquire,
    );
    log::debug!("[editor] session open");

    while !shared.stop.load(Ordering::Acquire) {
        if let Some(graph) = input.take() {
            if let Err(e) = session.load_graph(&graph) {
                log::warn!("[editor] failed to load graph: {e:#}");
            }
        }

        match session.poll() {
            Ok(SessionEvent::Idle) => {}
            Ok(SessionEvent::Edited(graph)) => output.send(graph),
            Ok(SessionEvent::Closed) => {
                log::debug!("[editor] session closed by user");
                break;
            }
            Err(e) => {
                log::warn!("[editor] session poll failed: {e:#}");
                break;
            }
        }

        thread::sleep(period);
    }

    shared.set(EditorState::Closing);
    session.close();
}
