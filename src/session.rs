//! Lifecycle core shared by the STT and TTS sessions.
//!
//! [`EngineSlot`] owns at most one loaded engine together with the config it
//! was built from, behind a single mutex.  Every operation on the engine goes
//! through the slot's lock, so two operations of the same kind never overlap
//! while the two kinds stay independent.
//!
//! Each operation gets its own [`CancellationToken`].  Starting an operation
//! swaps a fresh token into the slot instead of clearing the old one, so a
//! stream still replaying outside the lock keeps the token it was built with
//! and a later operation can neither clear nor inherit its cancellation.
//!
//! ```text
//! Uninitialized ──init ok──▶ Ready ──operation──▶ Busy ──done──▶ Ready
//!       ▲                      │ init (any outcome) releases the old engine
//!       └──── shutdown / failed init ◀┘
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use crate::cancel::CancellationToken;
use crate::error::SpeechError;

// ---------------------------------------------------------------------------
// EngineKind / SessionState
// ---------------------------------------------------------------------------

/// The two engine kinds a session can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Speech-to-text.
    Stt,
    /// Text-to-speech.
    Tts,
}

impl EngineKind {
    pub(crate) fn log_target(&self) -> &'static str {
        match self {
            EngineKind::Stt => "speech_session::stt",
            EngineKind::Tts => "speech_session::tts",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineKind::Stt => "STT",
            EngineKind::Tts => "TTS",
        })
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No engine loaded.
    Uninitialized,
    /// Engine loaded and idle.
    Ready,
    /// The kind's lock is held by an init, shutdown, or operation.
    Busy,
}

// ---------------------------------------------------------------------------
// EngineSlot
// ---------------------------------------------------------------------------

/// A loaded engine and the config it was built from.
pub(crate) struct Loaded<E, C> {
    pub engine: E,
    pub config: C,
}

pub(crate) struct EngineSlot<E, C> {
    kind: EngineKind,
    inner: Mutex<Option<Loaded<E, C>>>,
    loaded: AtomicBool,
    current: Mutex<CancellationToken>,
}

impl<E, C> EngineSlot<E, C> {
    pub fn new(kind: EngineKind) -> Self {
        Self {
            kind,
            inner: Mutex::new(None),
            loaded: AtomicBool::new(false),
            current: Mutex::new(CancellationToken::new()),
        }
    }

    /// Token of the most recently started operation.
    pub fn token(&self) -> CancellationToken {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Install a fresh token for the operation about to start.
    fn fresh_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        token
    }

    /// A failed call never leaves the engine half-mutated from our side, so a
    /// poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, Option<Loaded<E, C>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release any loaded engine, then build a new one from `config`.
    ///
    /// A pending cancellation is dropped whatever the outcome.  On failure the
    /// slot is left empty.
    pub fn replace<F>(&self, config: C, load: F) -> Result<(), SpeechError>
    where
        F: FnOnce(&C) -> Result<E, SpeechError>,
    {
        let target = self.kind.log_target();
        let mut guard = self.lock();

        if let Some(previous) = guard.take() {
            self.loaded.store(false, Ordering::SeqCst);
            drop(previous);
            log::info!(target: target, "{} engine released for re-init", self.kind);
        }

        let outcome = load(&config);
        self.fresh_token();

        match outcome {
            Ok(engine) => {
                *guard = Some(Loaded { engine, config });
                self.loaded.store(true, Ordering::SeqCst);
                log::info!(target: target, "{} engine ready", self.kind);
                Ok(())
            }
            Err(e) => {
                log::warn!(target: target, "{} engine init failed: {e}", self.kind);
                Err(e)
            }
        }
    }

    /// Release the engine if one is loaded.  Returns `true` if one was.
    pub fn shutdown(&self) -> bool {
        let mut guard = self.lock();
        let released = guard.take().is_some();
        self.loaded.store(false, Ordering::SeqCst);
        drop(guard);
        if released {
            log::info!(target: self.kind.log_target(), "{} engine shut down", self.kind);
        }
        released
    }

    /// Run `op` against the loaded engine under the lock.
    ///
    /// Fails with [`SpeechError::EngineNotReady`] without calling `op` when
    /// nothing is loaded; otherwise `op` receives a token of its own.
    pub fn with_ready<R, F>(&self, op: F) -> Result<R, SpeechError>
    where
        F: FnOnce(&mut Loaded<E, C>, &CancellationToken) -> Result<R, SpeechError>,
    {
        let mut guard = self.lock();
        let loaded = guard
            .as_mut()
            .ok_or(SpeechError::EngineNotReady { kind: self.kind })?;
        let token = self.fresh_token();
        op(loaded, &token)
    }

    /// Read the loaded config, if any.
    pub fn map_config<R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        self.lock().as_ref().map(|loaded| f(&loaded.config))
    }

    /// Whether an engine is loaded, without waiting for the lock.  Stays
    /// `true` while an operation runs on the engine.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        match self.inner.try_lock() {
            Ok(guard) => Self::state_of(&guard),
            Err(TryLockError::Poisoned(poisoned)) => Self::state_of(&poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => SessionState::Busy,
        }
    }

    fn state_of(slot: &Option<Loaded<E, C>>) -> SessionState {
        match slot {
            Some(_) => SessionState::Ready,
            None => SessionState::Uninitialized,
        }
    }

    /// Cancel the most recently started operation.
    pub fn cancel(&self) {
        log::info!(target: self.kind.log_target(), "{} cancel requested", self.kind);
        self.token().cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
