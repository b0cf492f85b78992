//! RIFF/WAVE PCM codec.
//!
//! Decoding accepts 16-bit signed PCM with any non-zero channel count and
//! skips unknown subchunks by their declared size.  Encoding always emits a
//! minimal 44-byte mono 16-bit header followed by the little-endian payload.
//!
//! ```text
//!  0  "RIFF"  4  riff size (36 + data)  8  "WAVE"
//! 12  "fmt "  16  16  20 format=1  22 channels=1  24 sample rate
//! 28  byte rate  32 block align  34 bits=16
//! 36  "data"  40  data size  44  samples…
//! ```

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::audio::buffer::{AudioBuffer, PCM16_SCALE};
use crate::error::{DecodeError, SpeechError};

/// Size of the header written by [`encode`].
pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// `fmt ` fields needed to interpret the `data` chunk.
#[derive(Debug, Clone, Copy)]
struct Format {
    channels: u16,
    sample_rate: u32,
}

/// Decode a RIFF/WAVE container into a normalized [`AudioBuffer`].
///
/// Channels are kept interleaved; call [`AudioBuffer::into_mono`] to
/// downmix.  A trailing partial frame is dropped.
pub fn decode(bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
    if bytes.len() < 4 || &bytes[0..4] != b"RIFF" {
        return Err(DecodeError::MissingRiff);
    }
    if bytes.len() < 12 || &bytes[8..12] != b"WAVE" {
        return Err(DecodeError::MissingWave);
    }

    let mut format: Option<Format> = None;
    let mut pos = 12usize;

    while bytes.len().saturating_sub(pos) >= 8 {
        let id = &bytes[pos..pos + 4];
        let size = LittleEndian::read_u32(&bytes[pos + 4..pos + 8]) as usize;
        let body = pos + 8;

        match id {
            b"fmt " => format = Some(read_format(&bytes[body..], size)?),
            b"data" => {
                let fmt = format.ok_or(DecodeError::MissingFormat)?;
                // Streaming writers leave the size at 0 or u32::MAX; clamp
                // to what is actually present.
                let end = body.saturating_add(size).min(bytes.len());
                return read_samples(&bytes[body..end], fmt);
            }
            _ => {}
        }

        // Odd-sized chunks carry one pad byte.
        pos = body.saturating_add(size).saturating_add(size & 1);
    }

    Err(DecodeError::MissingData)
}

fn read_format(body: &[u8], size: usize) -> Result<Format, DecodeError> {
    if size < 16 || body.len() < 16 {
        return Err(DecodeError::Truncated);
    }

    let mut cursor = Cursor::new(body);
    let audio_format = read_u16(&mut cursor)?;
    let channels = read_u16(&mut cursor)?;
    let sample_rate = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| DecodeError::Truncated)?;
    let _byte_rate = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| DecodeError::Truncated)?;
    let _block_align = read_u16(&mut cursor)?;
    let bits_per_sample = read_u16(&mut cursor)?;

    if audio_format != PCM_FORMAT {
        return Err(DecodeError::UnsupportedFormat(audio_format));
    }
    if bits_per_sample != BITS_PER_SAMPLE {
        return Err(DecodeError::UnsupportedBitDepth(bits_per_sample));
    }
    if channels == 0 {
        return Err(DecodeError::UnsupportedChannels(channels));
    }
    if sample_rate == 0 {
        return Err(DecodeError::InvalidSampleRate(sample_rate));
    }

    Ok(Format {
        channels,
        sample_rate,
    })
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16, DecodeError> {
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| DecodeError::Truncated)
}

fn read_samples(payload: &[u8], fmt: Format) -> Result<AudioBuffer, DecodeError> {
    let mut cursor = Cursor::new(payload);
    let mut samples = Vec::with_capacity(payload.len() / 2);
    while let Ok(sample) = cursor.read_i16::<LittleEndian>() {
        samples.push(sample as f32 / PCM16_SCALE);
    }

    let channels = fmt.channels as usize;
    samples.truncate(samples.len() - samples.len() % channels);

    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }

    Ok(AudioBuffer {
        samples,
        sample_rate: fmt.sample_rate,
        channels: fmt.channels,
    })
}

/// Read and decode a WAV file.
pub fn read_file(path: impl AsRef<Path>) -> Result<AudioBuffer, SpeechError> {
    let path = path.as_ref();
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| SpeechError::io(path, e))?;
    Ok(decode(&bytes)?)
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encode mono 16-bit samples as a playable WAV container.
pub fn encode(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = samples.len() * 2;
    let mut out = vec![0u8; WAV_HEADER_LEN + data_len];

    out[0..4].copy_from_slice(b"RIFF");
    LittleEndian::write_u32(&mut out[4..8], (36 + data_len) as u32);
    out[8..12].copy_from_slice(b"WAVE");

    out[12..16].copy_from_slice(b"fmt ");
    LittleEndian::write_u32(&mut out[16..20], 16);
    LittleEndian::write_u16(&mut out[20..22], PCM_FORMAT);
    LittleEndian::write_u16(&mut out[22..24], 1);
    LittleEndian::write_u32(&mut out[24..28], sample_rate);
    LittleEndian::write_u32(&mut out[28..32], sample_rate.saturating_mul(2));
    LittleEndian::write_u16(&mut out[32..34], 2);
    LittleEndian::write_u16(&mut out[34..36], BITS_PER_SAMPLE);

    out[36..40].copy_from_slice(b"data");
    LittleEndian::write_u32(&mut out[40..44], data_len as u32);
    LittleEndian::write_i16_into(samples, &mut out[WAV_HEADER_LEN..]);

    out
}

/// Write an encoded container to any sink.
pub fn write_to<W: Write>(writer: &mut W, samples: &[i16], sample_rate: u32) -> std::io::Result<()> {
    writer.write_all(&encode(samples, sample_rate))?;
    writer.flush()
}

/// Encode and write a WAV file, replacing any existing file.
pub fn write_file(
    path: impl AsRef<Path>,
    samples: &[i16],
    sample_rate: u32,
) -> Result<(), SpeechError> {
    let path = path.as_ref();
    File::create(path)
        .and_then(|f| write_to(&mut BufWriter::new(f), samples, sample_rate))
        .map_err(|e| SpeechError::io(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
