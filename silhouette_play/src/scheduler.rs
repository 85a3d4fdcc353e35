//! Cancelable, strictly sequential playback of placed notes.
//!
//! A single worker thread owns the [`TonePlayer`] and runs at most one
//! playback pass at a time.  The handle ([`PlaybackScheduler`]) and the
//! worker share one small state cell:
//!
//! ```text
//!   pass     — number of the newest pass (the cancellation token)
//!   playing  — true while that pass is live
//!   current  — index of the note sounding now
//! ```
//!
//! `start()` bumps `pass` and hands the number to the worker by value.
//! `stop()` clears `playing` at once, so the observable state is idle
//! without waiting for the sounding note.  The worker re-checks
//! `pass == mine && playing` before every note, and only ever writes to the
//! cell while that holds; a superseded pass therefore can't disturb a newer
//! one.
//!
//! A tone player that panics fails its pass like one that returns an error.
//! If the worker exits for any reason the cell is left idle and marked
//! closed, and `start()` refuses from then on.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use silhouette_map::PlacedNote;
use tracing::{debug, info, warn};

use crate::tone::TonePlayer;

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand — sent to the playback thread
// ════════════════════════════════════════════════════════════════════════════

enum PlayerCommand {
    /// Run one pass over `notes`, as long as `pass` stays live.
    Play { pass: u64, notes: Arc<[PlacedNote]> },
    /// Terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// PlaybackEvent — sent back for highlighting
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every note was played.
    Completed,
    /// `stop()` (or a newer cycle) ended the pass.
    Cancelled,
    /// The tone primitive failed; the rest of the pass was skipped.
    Failed(String),
}

/// Emitted by the worker so the UI can follow along.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    PassStarted { pass: u64, notes: usize },
    /// `note` is now sounding; highlight its spot.
    NoteStarted { pass: u64, index: usize, note: PlacedNote },
    PassEnded   { pass: u64, outcome: PassOutcome },
}

// ════════════════════════════════════════════════════════════════════════════
// Shared state
// ════════════════════════════════════════════════════════════════════════════

/// Consistent snapshot of the observable playback state.
///
/// `playing` is true exactly when `current_index` is `Some`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub pass:          u64,
    pub playing:       bool,
    pub current_index: Option<usize>,
}

#[derive(Debug, Default)]
struct PassState {
    pass:    u64,
    playing: bool,
    current: Option<usize>,
    /// Set once the worker has exited.
    closed:  bool,
}

impl PassState {
    fn owned_by(&self, pass: u64) -> bool { self.playing && self.pass == pass }

    fn go_idle(&mut self) {
        self.playing = false;
        self.current = None;
    }
}

fn lock(state: &Mutex<PassState>) -> MutexGuard<'_, PassState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ════════════════════════════════════════════════════════════════════════════
// PlaybackScheduler — handle to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub struct PlaybackScheduler {
    state:    Arc<Mutex<PassState>>,
    cmd_tx:   Sender<PlayerCommand>,
    event_rx: Receiver<PlaybackEvent>,
    notes:    Arc<[PlacedNote]>,
}

impl PlaybackScheduler {
    /// Spawn the playback thread around `tone`.  The sequence starts empty.
    pub fn spawn<T: TonePlayer>(tone: T) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let (event_tx, event_rx) = mpsc::channel::<PlaybackEvent>();
        let state = Arc::new(Mutex::new(PassState::default()));

        let worker_state = Arc::clone(&state);
        thread::spawn(move || player_thread(tone, worker_state, cmd_rx, event_tx));

        PlaybackScheduler { state, cmd_tx, event_rx, notes: Arc::from(Vec::new()) }
    }

    /// Replace the sequence with a new cycle's notes.  Any running pass is
    /// stopped first.
    pub fn load(&mut self, notes: Vec<PlacedNote>) {
        self.stop();
        self.notes = Arc::from(notes);
    }

    pub fn notes(&self) -> &[PlacedNote] { &self.notes }

    /// Begin a pass.  Returns false (and does nothing) if a pass is already
    /// running or the sequence is empty.
    pub fn start(&self) -> bool {
        let pass = {
            let mut st = lock(&self.state);
            if st.closed || st.playing || self.notes.is_empty() {
                return false;
            }
            st.pass += 1;
            st.playing = true;
            st.current = Some(0);
            st.pass
        };

        let cmd = PlayerCommand::Play { pass, notes: Arc::clone(&self.notes) };
        if self.cmd_tx.send(cmd).is_err() {
            warn!(pass, "playback thread is gone");
            let mut st = lock(&self.state);
            if st.owned_by(pass) { st.go_idle(); }
            return false;
        }
        debug!(pass, notes = self.notes.len(), "pass requested");
        true
    }

    /// Cancel the running pass, if any.  Takes effect immediately for the
    /// observable state; the sounding note is allowed to finish.
    pub fn stop(&self) {
        let mut st = lock(&self.state);
        if st.playing {
            debug!(pass = st.pass, "pass cancelled");
            st.go_idle();
        }
    }

    pub fn is_playing(&self) -> bool { lock(&self.state).playing }

    /// False once the playback thread has exited; no pass can start after
    /// that.
    pub fn is_alive(&self) -> bool { !lock(&self.state).closed }

    pub fn current_index(&self) -> Option<usize> { lock(&self.state).current }

    pub fn status(&self) -> PlaybackStatus {
        let st = lock(&self.state);
        PlaybackStatus { pass: st.pass, playing: st.playing, current_index: st.current }
    }

    /// Drain any pending events (non-blocking).
    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        let mut out = Vec::new();
        while let Ok(e) = self.event_rx.try_recv() { out.push(e); }
        out
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_event(&self, timeout: Duration) -> Option<PlaybackEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(e) => Some(e),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.stop();
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn player_thread<T: TonePlayer>(
    mut tone: T,
    state:    Arc<Mutex<PassState>>,
    cmd_rx:   Receiver<PlayerCommand>,
    event_tx: Sender<PlaybackEvent>,
) {
    let _exit = WorkerExit(Arc::clone(&state));
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            PlayerCommand::Play { pass, notes } => {
                let outcome = run_pass(&mut tone, &state, pass, &notes, &event_tx);
                info!(pass, ?outcome, "playback pass ended");
                let _ = event_tx.send(PlaybackEvent::PassEnded { pass, outcome });
            }
            PlayerCommand::Quit => return,
        }
    }
}

fn run_pass<T: TonePlayer>(
    tone:   &mut T,
    state:  &Mutex<PassState>,
    pass:   u64,
    notes:  &[PlacedNote],
    events: &Sender<PlaybackEvent>,
) -> PassOutcome {
    info!(pass, notes = notes.len(), "playback pass started");
    let _ = events.send(PlaybackEvent::PassStarted { pass, notes: notes.len() });

    for (index, note) in notes.iter().enumerate() {
        {
            let mut st = lock(state);
            if !st.owned_by(pass) {
                return PassOutcome::Cancelled;
            }
            st.current = Some(index);
        }

        let _ = events.send(PlaybackEvent::NoteStarted { pass, index, note: note.clone() });

        let played = panic::catch_unwind(AssertUnwindSafe(|| tone.play_tone(&note.note)));
        let failure = match played {
            Ok(Ok(()))   => None,
            Ok(Err(e))   => Some(e.to_string()),
            Err(payload) => Some(format!("tone player panicked: {}", panic_message(&*payload))),
        };
        if let Some(reason) = failure {
            warn!(pass, index, "tone failed: {}", reason);
            release(state, pass);
            return PassOutcome::Failed(reason);
        }
    }

    if release(state, pass) { PassOutcome::Completed } else { PassOutcome::Cancelled }
}

/// Return to idle if `pass` still owns the state.  False if it was
/// cancelled or superseded meanwhile.
fn release(state: &Mutex<PassState>, pass: u64) -> bool {
    let mut st = lock(state);
    let owned = st.owned_by(pass);
    if owned { st.go_idle(); }
    owned
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown cause"
    }
}

/// Leaves the shared state idle and closed when the worker returns or
/// unwinds.
struct WorkerExit(Arc<Mutex<PassState>>);

impl Drop for WorkerExit {
    fn drop(&mut self) {
        let mut st = lock(&self.0);
        st.go_idle();
        st.closed = true;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::ToneError;
    use silhouette_map::{Coordinate, Note};

    const WAIT: Duration = Duration::from_secs(5);

    fn placed(n: usize) -> Vec<PlacedNote> {
        (0..n).map(|i| PlacedNote::new(
            Note::new(format!("n{i}"), 440.0, 0.0),
            format!("{i}-0"),
            Coordinate::new(15 * (i as u32 + 1), 15),
        )).collect()
    }

    /// Reports each note as it starts, then blocks until the test opens
    /// the gate once.  Fails on the label in `fail_on`.
    struct GatedTone {
        started: Sender<String>,
        gate:    Receiver<()>,
        fail_on: Option<String>,
    }

    impl TonePlayer for GatedTone {
        fn play_tone(&mut self, note: &Note) -> Result<(), ToneError> {
            let _ = self.started.send(note.value.clone());
            if self.fail_on.as_deref() == Some(note.value.as_str()) {
                return Err(ToneError::Backend("speaker unplugged".into()));
            }
            self.gate.recv().map_err(|_| ToneError::Backend("gate closed".into()))
        }
    }

    /// Panics on the label in `panic_on`, plays everything else instantly.
    struct PanickyTone {
        panic_on: &'static str,
    }

    impl TonePlayer for PanickyTone {
        fn play_tone(&mut self, note: &Note) -> Result<(), ToneError> {
            if note.value == self.panic_on {
                panic!("synth crashed on {}", note.value);
            }
            Ok(())
        }
    }

    struct Rig {
        sched:   PlaybackScheduler,
        started: Receiver<String>,
        gate:    Sender<()>,
    }

    fn rig(n: usize, fail_on: Option<&str>) -> Rig {
        let (started_tx, started) = mpsc::channel();
        let (gate, gate_rx) = mpsc::channel();
        let mut sched = PlaybackScheduler::spawn(GatedTone {
            started: started_tx,
            gate:    gate_rx,
            fail_on: fail_on.map(str::to_string),
        });
        sched.load(placed(n));
        Rig { sched, started, gate }
    }

    fn wait_for_end(sched: &PlaybackScheduler) -> (u64, PassOutcome) {
        loop {
            match sched.next_event(WAIT).expect("pass never ended") {
                PlaybackEvent::PassEnded { pass, outcome } => return (pass, outcome),
                _ => continue,
            }
        }
    }

    fn assert_consistent(s: PlaybackStatus) {
        assert_eq!(s.playing, s.current_index.is_some(), "{s:?}");
    }

    #[test]
    fn plays_every_note_in_order() {
        let r = rig(4, None);
        assert!(r.sched.start());
        for i in 0..4 {
            assert_eq!(r.started.recv_timeout(WAIT).unwrap(), format!("n{i}"));
            assert_eq!(r.sched.current_index(), Some(i));
            assert_consistent(r.sched.status());
            r.gate.send(()).unwrap();
        }
        assert_eq!(wait_for_end(&r.sched), (1, PassOutcome::Completed));
        assert!(!r.sched.is_playing());
        assert_eq!(r.sched.current_index(), None);
    }

    #[test]
    fn note_events_follow_sequence() {
        let r = rig(3, None);
        for _ in 0..3 { r.gate.send(()).unwrap(); }
        assert!(r.sched.start());
        let mut seen = Vec::new();
        loop {
            match r.sched.next_event(WAIT).unwrap() {
                PlaybackEvent::NoteStarted { index, note, .. } => {
                    assert_eq!(note.id, format!("{index}-0"));
                    seen.push(index);
                }
                PlaybackEvent::PassEnded { outcome, .. } => {
                    assert_eq!(outcome, PassOutcome::Completed);
                    break;
                }
                PlaybackEvent::PassStarted { notes, .. } => assert_eq!(notes, 3),
            }
        }
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn stop_is_immediate_and_skips_the_rest() {
        let r = rig(5, None);
        assert!(r.sched.start());
        assert_eq!(r.started.recv_timeout(WAIT).unwrap(), "n0");

        r.sched.stop();
        assert!(!r.sched.is_playing());
        assert_eq!(r.sched.current_index(), None);

        r.gate.send(()).unwrap();
        assert_eq!(wait_for_end(&r.sched), (1, PassOutcome::Cancelled));
        assert!(r.started.try_recv().is_err(), "a note after stop was played");
    }

    #[test]
    fn stop_is_idempotent() {
        let r = rig(2, None);
        r.sched.stop();
        r.sched.stop();
        assert!(r.sched.start());
        r.sched.stop();
        r.sched.stop();
        assert_consistent(r.sched.status());
        r.gate.send(()).unwrap();
        assert_eq!(wait_for_end(&r.sched).1, PassOutcome::Cancelled);
    }

    #[test]
    fn second_start_is_a_no_op() {
        let r = rig(3, None);
        assert!(r.sched.start());
        assert!(!r.sched.start());
        for _ in 0..3 {
            r.started.recv_timeout(WAIT).unwrap();
            r.gate.send(()).unwrap();
        }
        assert_eq!(wait_for_end(&r.sched), (1, PassOutcome::Completed));
        assert!(r.started.try_recv().is_err());
        assert_eq!(r.sched.status().pass, 1);
    }

    #[test]
    fn empty_sequence_never_starts() {
        let sched = PlaybackScheduler::spawn(crate::tone::SilentTone);
        assert!(!sched.start());
        assert_eq!(sched.status(), PlaybackStatus::default());
    }

    #[test]
    fn tone_failure_aborts_pass() {
        let r = rig(4, Some("n1"));
        assert!(r.sched.start());
        assert_eq!(r.started.recv_timeout(WAIT).unwrap(), "n0");
        r.gate.send(()).unwrap();
        assert_eq!(r.started.recv_timeout(WAIT).unwrap(), "n1");

        let (pass, outcome) = wait_for_end(&r.sched);
        assert_eq!(pass, 1);
        assert!(matches!(outcome, PassOutcome::Failed(ref m) if m.contains("unplugged")));
        assert!(!r.sched.is_playing());
        assert_eq!(r.sched.current_index(), None);
        assert!(r.started.try_recv().is_err());
    }

    #[test]
    fn panicking_tone_fails_pass_and_frees_scheduler() {
        let mut sched = PlaybackScheduler::spawn(PanickyTone { panic_on: "n0" });
        sched.load(placed(1));
        assert!(sched.start());

        let (pass, outcome) = wait_for_end(&sched);
        assert_eq!(pass, 1);
        assert!(matches!(outcome, PassOutcome::Failed(ref m) if m.contains("synth crashed on n0")), "{outcome:?}");
        assert_eq!(sched.status(), PlaybackStatus { pass: 1, playing: false, current_index: None });
        assert!(sched.is_alive());

        // The worker survived and takes the next pass.
        sched.load(placed(1));
        assert!(sched.start());
        assert!(matches!(wait_for_end(&sched), (2, PassOutcome::Failed(_))));
    }

    #[test]
    fn dead_worker_leaves_state_idle_and_refuses_start() {
        let mut sched = PlaybackScheduler::spawn(crate::tone::SilentTone);
        sched.load(placed(1));
        let _ = sched.cmd_tx.send(PlayerCommand::Quit);

        let deadline = std::time::Instant::now() + WAIT;
        while sched.is_alive() {
            assert!(std::time::Instant::now() < deadline, "worker never exited");
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!sched.start());
        assert_eq!(sched.status(), PlaybackStatus::default());
    }

    #[test]
    fn restart_after_stop_ignores_stale_pass() {
        let r = rig(2, None);
        assert!(r.sched.start());
        assert_eq!(r.started.recv_timeout(WAIT).unwrap(), "n0");
        r.sched.stop();

        // The first pass is still blocked on n0; a new one may be requested.
        assert!(r.sched.start());
        assert_eq!(r.sched.status(), PlaybackStatus { pass: 2, playing: true, current_index: Some(0) });

        // Release n0 of pass 1: it must bow out without touching pass 2.
        r.gate.send(()).unwrap();
        assert_eq!(wait_for_end(&r.sched), (1, PassOutcome::Cancelled));
        assert!(r.sched.is_playing());

        // Pass 2 plays from the top.
        assert_eq!(r.started.recv_timeout(WAIT).unwrap(), "n0");
        r.gate.send(()).unwrap();
        assert_eq!(r.started.recv_timeout(WAIT).unwrap(), "n1");
        r.gate.send(()).unwrap();
        assert_eq!(wait_for_end(&r.sched), (2, PassOutcome::Completed));
        assert_consistent(r.sched.status());
        assert!(!r.sched.is_playing());
    }

    #[test]
    fn stop_during_last_note_reports_cancelled() {
        let r = rig(1, None);
        assert!(r.sched.start());
        r.started.recv_timeout(WAIT).unwrap();
        r.sched.stop();
        r.gate.send(()).unwrap();
        assert_eq!(wait_for_end(&r.sched).1, PassOutcome::Cancelled);
    }

    #[test]
    fn load_stops_and_replaces() {
        let mut r = rig(3, None);
        assert!(r.sched.start());
        r.started.recv_timeout(WAIT).unwrap();

        r.sched.load(placed(1));
        assert!(!r.sched.is_playing());
        assert_eq!(r.sched.notes().len(), 1);

        r.gate.send(()).unwrap();
        assert_eq!(wait_for_end(&r.sched).1, PassOutcome::Cancelled);
    }
}
