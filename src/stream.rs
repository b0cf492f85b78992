//! Chunked delivery of finished engine output.
//!
//! Neither engine produces output incrementally, so streaming here is
//! batch-then-replay: the engine runs to completion under the session lock,
//! then the output is handed to a pull-style stream that the caller drains
//! *after* the lock is released.
//!
//! ```text
//! SttSession::transcribe_segments ─▶ TranscriptionStream ─▶ deliver_transcription ─▶ TranscriptionSink
//! TtsSession::synthesize_chunks   ─▶ SynthesisStream     ─▶ deliver_synthesis     ─▶ SynthesisSink
//! ```
//!
//! Each stream polls the [`CancellationToken`] of the operation that built it
//! before every unit of work.  Once cancelled, a stream yields nothing further and its outcome is
//! [`StreamOutcome::Cancelled`].

use crate::cancel::CancellationToken;
use crate::error::SpeechError;
use crate::stt::{Segment, TranscriptionResult};

/// Samples per synthesis chunk.  At 22 050 Hz this is about 186 ms of audio.
pub const CHUNK_SAMPLES: usize = 4096;

/// How a streamed operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every unit was delivered and the success callback fired.
    Completed,
    /// A cancellation request stopped delivery.
    Cancelled,
    /// The operation failed and the error callback fired.
    Failed,
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Receiver for chunked synthesis output.
///
/// Per operation: zero or more `on_chunk`, then exactly one of
/// `on_complete` / `on_error`.  A clean cancellation ends the sequence after
/// the last delivered chunk with no terminal callback.
pub trait SynthesisSink {
    fn on_chunk(&mut self, samples: &[i16]);
    fn on_complete(&mut self);
    fn on_error(&mut self, error: &SpeechError);
}

/// Receiver for replayed transcription segments.
///
/// Per operation: zero or more `on_partial`, then exactly one of
/// `on_final` / `on_error`.  Cancellation arrives as `on_error` with
/// [`SpeechError::Cancelled`].
pub trait TranscriptionSink {
    /// Called once per segment with the text accumulated so far.
    fn on_partial(&mut self, text_so_far: &str);
    fn on_final(&mut self, result: TranscriptionResult);
    fn on_error(&mut self, error: &SpeechError);
}

// ---------------------------------------------------------------------------
// SynthesisStream
// ---------------------------------------------------------------------------

/// Fixed-size windows over a finished synthesis buffer.
#[derive(Debug)]
pub struct SynthesisStream {
    samples: Vec<i16>,
    sample_rate: u32,
    chunk_size: usize,
    pos: usize,
    token: CancellationToken,
    outcome: Option<StreamOutcome>,
}

impl SynthesisStream {
    pub(crate) fn new(samples: Vec<i16>, sample_rate: u32, token: CancellationToken) -> Self {
        Self::with_chunk_size(samples, sample_rate, CHUNK_SAMPLES, token)
    }

    pub(crate) fn with_chunk_size(
        samples: Vec<i16>,
        sample_rate: u32,
        chunk_size: usize,
        token: CancellationToken,
    ) -> Self {
        Self {
            samples,
            sample_rate,
            chunk_size: chunk_size.max(1),
            pos: 0,
            token,
            outcome: None,
        }
    }

    /// Sample rate of every chunk.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total samples in the underlying buffer.
    pub fn total_samples(&self) -> usize {
        self.samples.len()
    }

    /// `None` until the stream is exhausted.
    pub fn outcome(&self) -> Option<StreamOutcome> {
        self.outcome
    }

    /// Token this stream polls; cancelling it stops the stream at the next
    /// chunk.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Iterator for SynthesisStream {
    type Item = Vec<i16>;

    fn next(&mut self) -> Option<Vec<i16>> {
        if self.outcome.is_some() {
            return None;
        }
        if self.token.is_cancelled() {
            self.outcome = Some(StreamOutcome::Cancelled);
            return None;
        }
        if self.pos >= self.samples.len() {
            self.outcome = Some(StreamOutcome::Completed);
            return None;
        }
        let end = (self.pos + self.chunk_size).min(self.samples.len());
        let chunk = self.samples[self.pos..end].to_vec();
        self.pos = end;
        Some(chunk)
    }
}

/// Push every chunk of `stream` into `sink`, then signal completion unless
/// the stream was cancelled.
pub fn deliver_synthesis<S>(mut stream: SynthesisStream, sink: &mut S) -> StreamOutcome
where
    S: SynthesisSink + ?Sized,
{
    let mut delivered = 0usize;
    for chunk in stream.by_ref() {
        sink.on_chunk(&chunk);
        delivered += 1;
    }

    match stream.outcome() {
        Some(StreamOutcome::Cancelled) => {
            log::info!(
                target: "speech_session::tts",
                "synthesis stream cancelled after {delivered} chunk(s)"
            );
            StreamOutcome::Cancelled
        }
        _ => {
            log::debug!(target: "speech_session::tts", "synthesis stream delivered {delivered} chunk(s)");
            sink.on_complete();
            StreamOutcome::Completed
        }
    }
}

// ---------------------------------------------------------------------------
// TranscriptionStream
// ---------------------------------------------------------------------------

/// One replayed segment plus the transcript accumulated up to and including
/// it.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialTranscript {
    pub segment: Segment,
    pub text_so_far: String,
}

/// Segments of a finished transcription, replayed in engine order.
#[derive(Debug)]
pub struct TranscriptionStream {
    pending: std::vec::IntoIter<Segment>,
    delivered: Vec<Segment>,
    text: String,
    language: String,
    duration_ms: u64,
    token: CancellationToken,
    outcome: Option<StreamOutcome>,
}

impl TranscriptionStream {
    pub(crate) fn new(
        segments: Vec<Segment>,
        language: String,
        duration_ms: u64,
        token: CancellationToken,
    ) -> Self {
        Self {
            delivered: Vec::with_capacity(segments.len()),
            pending: segments.into_iter(),
            text: String::new(),
            language,
            duration_ms,
            token,
            outcome: None,
        }
    }

    /// Audio duration of the transcribed input.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// `None` until the stream is exhausted.
    pub fn outcome(&self) -> Option<StreamOutcome> {
        self.outcome
    }

    pub fn cancel_handle(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Drain the remaining segments and build the aggregate result.
    ///
    /// Returns [`SpeechError::Cancelled`] if cancellation was observed at any
    /// point, including after the last segment.
    pub fn finish(mut self) -> Result<TranscriptionResult, SpeechError> {
        while self.next().is_some() {}
        match self.outcome {
            Some(StreamOutcome::Completed) => Ok(TranscriptionResult {
                text: self.text.trim().to_string(),
                segments: self.delivered,
                language: self.language,
                duration_ms: self.duration_ms,
            }),
            _ => Err(SpeechError::Cancelled),
        }
    }
}

impl Iterator for TranscriptionStream {
    type Item = PartialTranscript;

    fn next(&mut self) -> Option<PartialTranscript> {
        if self.outcome.is_some() {
            return None;
        }
        if self.token.is_cancelled() {
            self.outcome = Some(StreamOutcome::Cancelled);
            return None;
        }
        let Some(segment) = self.pending.next() else {
            self.outcome = Some(StreamOutcome::Completed);
            return None;
        };

        self.text.push_str(&segment.text);
        self.delivered.push(segment.clone());
        Some(PartialTranscript {
            segment,
            text_so_far: self.text.trim().to_string(),
        })
    }
}

/// Push a partial for every segment of `stream` into `sink`, then exactly
/// one of `on_final` or `on_error`.
pub fn deliver_transcription<S>(mut stream: TranscriptionStream, sink: &mut S) -> StreamOutcome
where
    S: TranscriptionSink + ?Sized,
{
    for partial in stream.by_ref() {
        sink.on_partial(&partial.text_so_far);
    }

    match stream.finish() {
        Ok(result) => {
            sink.on_final(result);
            StreamOutcome::Completed
        }
        Err(e) => {
            log::info!(target: "speech_session::stt", "transcription stream cancelled");
            sink.on_error(&e);
            StreamOutcome::Cancelled
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
