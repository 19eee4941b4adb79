//! Audio capture and phrase endpointing
//!
//! Audio comes either from the default microphone (feature `audio`) or from
//! a WAV file. Both are read through [`AudioSource`] and cut into a single
//! phrase by an energy-based [`Endpointer`].

use crate::config::CaptureConfig;
use crate::error::{ConversaiError, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sample rate for microphone capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Analysis frame length
pub const FRAME_MS: u64 = 30;

/// Where a spoken question is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Default input device
    Microphone,
    /// Pre-recorded WAV file
    WavFile(PathBuf),
}

impl InputSource {
    /// Open the source for reading
    ///
    /// Sources are opened on the thread that reads them, since audio
    /// streams are not always `Send`. Live input stops after the listen
    /// timeout plus the phrase limit of `config`, whatever the device does.
    ///
    /// # Errors
    ///
    /// Returns an `Audio` error if the device or file cannot be opened
    #[cfg_attr(not(feature = "audio"), allow(unused_variables))]
    pub fn open(&self, config: CaptureConfig) -> Result<Box<dyn AudioSource>> {
        match self {
            Self::WavFile(path) => Ok(Box::new(WavFileSource::open(path)?)),
            #[cfg(feature = "audio")]
            Self::Microphone => Ok(Box::new(MicrophoneSource::open(capture_budget(config))?)),
            #[cfg(not(feature = "audio"))]
            Self::Microphone => Err(ConversaiError::Audio(
                "microphone capture requires the `audio` feature; pass a WAV file instead"
                    .to_string(),
            )
            .into()),
        }
    }
}

/// Longest a live capture may run
pub fn capture_budget(config: CaptureConfig) -> Duration {
    Duration::from_secs(config.listen_timeout_seconds + config.phrase_limit_seconds)
}

/// A blocking stream of mono f32 samples
pub trait AudioSource {
    /// Samples per second
    fn sample_rate(&self) -> u32;

    /// Next batch of samples, or `None` once the source is exhausted
    ///
    /// # Errors
    ///
    /// Returns an `Audio` error if the underlying device or file fails
    fn next_chunk(&mut self) -> Result<Option<Vec<f32>>>;
}

/// Outcome of feeding one frame to the endpointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointDecision {
    /// Keep listening; the frame is not part of a phrase yet
    Waiting,
    /// Keep listening; the frame belongs to the phrase
    Recording,
    /// The phrase is complete, including this frame
    Complete,
    /// Listen timeout elapsed without speech
    NoSpeech,
}

/// Energy-based start/end-of-speech detector
///
/// Time is measured in frames, not wall clock, so file input and live
/// input endpoint identically.
#[derive(Debug, Clone)]
pub struct Endpointer {
    config: CaptureConfig,
    started: bool,
    waited_ms: u64,
    phrase_ms: u64,
    silence_ms: u64,
}

impl Endpointer {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            started: false,
            waited_ms: 0,
            phrase_ms: 0,
            silence_ms: 0,
        }
    }

    /// Whether speech has been detected
    pub fn speech_started(&self) -> bool {
        self.started
    }

    /// Feed the next 30 ms frame
    ///
    /// # Examples
    ///
    /// ```
    /// use conversai::config::CaptureConfig;
    /// use conversai::speech::{EndpointDecision, Endpointer};
    ///
    /// let mut endpointer = Endpointer::new(CaptureConfig::default());
    /// assert_eq!(endpointer.push_frame(&[0.0; 480]), EndpointDecision::Waiting);
    /// assert_eq!(endpointer.push_frame(&[0.5; 480]), EndpointDecision::Recording);
    /// ```
    pub fn push_frame(&mut self, frame: &[f32]) -> EndpointDecision {
        let loud = rms(frame) > self.config.energy_threshold;

        if !self.started {
            if loud {
                self.started = true;
                self.phrase_ms = FRAME_MS;
                return EndpointDecision::Recording;
            }
            self.waited_ms += FRAME_MS;
            if self.waited_ms >= self.config.listen_timeout_seconds * 1000 {
                return EndpointDecision::NoSpeech;
            }
            return EndpointDecision::Waiting;
        }

        self.phrase_ms += FRAME_MS;
        if loud {
            self.silence_ms = 0;
        } else {
            self.silence_ms += FRAME_MS;
        }

        if self.silence_ms >= self.config.pause_threshold_ms
            || self.phrase_ms >= self.config.phrase_limit_seconds * 1000
        {
            EndpointDecision::Complete
        } else {
            EndpointDecision::Recording
        }
    }
}

/// Root-mean-square level of a frame
pub fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f32 = frame.iter().map(|s| s * s).sum();
    (sum / frame.len() as f32).sqrt()
}

/// Read from `source` until one phrase has been captured
///
/// Returns `Ok(None)` if no speech was detected before the listen timeout
/// or the end of the source.
///
/// # Errors
///
/// Propagates errors from the source
pub fn record_phrase(source: &mut dyn AudioSource, config: CaptureConfig) -> Result<Option<Vec<f32>>> {
    let frame_len = (source.sample_rate() as u64 * FRAME_MS / 1000).max(1) as usize;
    let mut endpointer = Endpointer::new(config);
    let mut pending: Vec<f32> = Vec::new();
    let mut phrase: Vec<f32> = Vec::new();

    while let Some(chunk) = source.next_chunk()? {
        pending.extend_from_slice(&chunk);

        let mut consumed = 0;
        while pending.len() - consumed >= frame_len {
            let frame = &pending[consumed..consumed + frame_len];
            consumed += frame_len;

            match endpointer.push_frame(frame) {
                EndpointDecision::Waiting => {}
                EndpointDecision::Recording => phrase.extend_from_slice(frame),
                EndpointDecision::Complete => {
                    phrase.extend_from_slice(frame);
                    tracing::debug!(samples = phrase.len(), "phrase complete");
                    return Ok(Some(phrase));
                }
                EndpointDecision::NoSpeech => {
                    tracing::debug!("listen timeout without speech");
                    return Ok(None);
                }
            }
        }
        pending.drain(..consumed);
    }

    if endpointer.speech_started() {
        phrase.extend_from_slice(&pending);
        tracing::debug!(samples = phrase.len(), "source ended during phrase");
        Ok(Some(phrase))
    } else {
        Ok(None)
    }
}

/// Reads a WAV file, down-mixed to mono
pub struct WavFileSource {
    sample_rate: u32,
    samples: Vec<f32>,
    position: usize,
}

impl WavFileSource {
    const CHUNK: usize = 4096;

    /// Open and decode a WAV file
    ///
    /// # Errors
    ///
    /// Returns an `Audio` error if the file is missing or not a valid WAV
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path).map_err(|e| {
            ConversaiError::Audio(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| ConversaiError::Audio(e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| ConversaiError::Audio(e.to_string()))?
            }
        };

        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect::<Vec<_>>();

        tracing::debug!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            samples = samples.len(),
            "loaded WAV input"
        );

        Ok(Self {
            sample_rate: spec.sample_rate,
            samples,
            position: 0,
        })
    }
}

impl AudioSource for WavFileSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }
        let end = (self.position + Self::CHUNK).min(self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(Some(chunk))
    }
}

/// Samples pushed by a device callback, drained with a wall-clock deadline
///
/// A device that stalls or errors stops delivering samples without closing
/// anything, so the deadline is the only thing that ends the read.
pub struct StreamBuffer {
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    deadline: Instant,
    received: bool,
}

impl StreamBuffer {
    const POLL: Duration = Duration::from_millis(20);

    pub fn new(sample_rate: u32, budget: Duration) -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::new())),
            sample_rate,
            deadline: Instant::now() + budget,
            received: false,
        }
    }

    /// Handle for the producer side
    pub fn sink(&self) -> Arc<Mutex<Vec<f32>>> {
        Arc::clone(&self.samples)
    }
}

impl AudioSource for StreamBuffer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Wait for samples until the deadline
    ///
    /// Past the deadline the source reports exhaustion, or an `Audio` error
    /// if the device never delivered anything.
    fn next_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        loop {
            let chunk = self
                .samples
                .lock()
                .map(|mut buf| std::mem::take(&mut *buf))
                .map_err(|_| ConversaiError::Audio("capture buffer poisoned".to_string()))?;

            if Instant::now() >= self.deadline {
                if self.received || !chunk.is_empty() {
                    tracing::debug!("capture deadline reached");
                    return Ok(None);
                }
                return Err(ConversaiError::Audio(
                    "input device delivered no audio".to_string(),
                )
                .into());
            }

            if !chunk.is_empty() {
                self.received = true;
                return Ok(Some(chunk));
            }
            std::thread::sleep(Self::POLL);
        }
    }
}

/// Captures audio from the default input device
#[cfg(feature = "audio")]
pub struct MicrophoneSource {
    buffer: StreamBuffer,
    _stream: cpal::Stream,
}

#[cfg(feature = "audio")]
impl MicrophoneSource {
    /// Open the default input device at 16 kHz mono and start capturing
    ///
    /// Reads end once `budget` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns an `Audio` error if no suitable input device is available
    pub fn open(budget: Duration) -> Result<Self> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
        use cpal::SampleRate;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| ConversaiError::Audio("no input device available".to_string()))?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| ConversaiError::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| ConversaiError::Audio("no suitable audio config found".to_string()))?;
        let config = supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config();

        let buffer = StreamBuffer::new(SAMPLE_RATE, budget);
        let sink = buffer.sink();
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| tracing::error!(error = %err, "audio capture error"),
                None,
            )
            .map_err(|e| ConversaiError::Audio(e.to_string()))?;
        stream
            .play()
            .map_err(|e| ConversaiError::Audio(e.to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone capture started"
        );

        Ok(Self {
            buffer,
            _stream: stream,
        })
    }
}

#[cfg(feature = "audio")]
impl AudioSource for MicrophoneSource {
    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        self.buffer.next_chunk()
    }
}

/// Convert f32 samples to 16-bit mono WAV bytes
///
/// # Errors
///
/// Returns an `Audio` error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| ConversaiError::Audio(e.to_string()))?;

        for &sample in samples {
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| ConversaiError::Audio(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| ConversaiError::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_dir;

    const FRAME: usize = (SAMPLE_RATE as usize) * 30 / 1000;

    fn config() -> CaptureConfig {
        CaptureConfig {
            energy_threshold: 0.1,
            pause_threshold_ms: 90,
            listen_timeout_seconds: 1,
            phrase_limit_seconds: 2,
        }
    }

    struct VecSource {
        chunks: std::vec::IntoIter<Vec<f32>>,
    }

    impl VecSource {
        fn new(samples: Vec<f32>, chunk: usize) -> Self {
            let chunks: Vec<Vec<f32>> = samples.chunks(chunk).map(|c| c.to_vec()).collect();
            Self {
                chunks: chunks.into_iter(),
            }
        }
    }

    impl AudioSource for VecSource {
        fn sample_rate(&self) -> u32 {
            SAMPLE_RATE
        }

        fn next_chunk(&mut self) -> Result<Option<Vec<f32>>> {
            Ok(self.chunks.next())
        }
    }

    fn frames(level: f32, count: usize) -> Vec<f32> {
        vec![level; FRAME * count]
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[0.5, -0.5]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_endpointer_completes_after_pause() {
        let mut endpointer = Endpointer::new(config());
        assert_eq!(endpointer.push_frame(&frames(0.0, 1)), EndpointDecision::Waiting);
        assert_eq!(endpointer.push_frame(&frames(0.5, 1)), EndpointDecision::Recording);
        assert_eq!(endpointer.push_frame(&frames(0.0, 1)), EndpointDecision::Recording);
        assert_eq!(endpointer.push_frame(&frames(0.0, 1)), EndpointDecision::Recording);
        assert_eq!(endpointer.push_frame(&frames(0.0, 1)), EndpointDecision::Complete);
    }

    #[test]
    fn test_endpointer_speech_resets_pause() {
        let mut endpointer = Endpointer::new(config());
        endpointer.push_frame(&frames(0.5, 1));
        endpointer.push_frame(&frames(0.0, 1));
        endpointer.push_frame(&frames(0.0, 1));
        assert_eq!(endpointer.push_frame(&frames(0.5, 1)), EndpointDecision::Recording);
        assert_eq!(endpointer.push_frame(&frames(0.0, 1)), EndpointDecision::Recording);
    }

    #[test]
    fn test_endpointer_listen_timeout() {
        let mut endpointer = Endpointer::new(config());
        let mut decision = EndpointDecision::Waiting;
        for _ in 0..34 {
            decision = endpointer.push_frame(&frames(0.0, 1));
        }
        assert_eq!(decision, EndpointDecision::NoSpeech);
        assert!(!endpointer.speech_started());
    }

    #[test]
    fn test_endpointer_phrase_limit() {
        let mut endpointer = Endpointer::new(config());
        let mut decisions = Vec::new();
        for _ in 0..67 {
            decisions.push(endpointer.push_frame(&frames(0.5, 1)));
        }
        assert_eq!(decisions.last(), Some(&EndpointDecision::Complete));
        assert!(decisions[..66]
            .iter()
            .all(|d| *d == EndpointDecision::Recording));
    }

    #[test]
    fn test_record_phrase_trims_leading_silence() {
        let mut samples = frames(0.0, 5);
        samples.extend(frames(0.5, 4));
        samples.extend(frames(0.0, 10));
        let mut source = VecSource::new(samples, 1000);

        let phrase = record_phrase(&mut source, config()).unwrap().unwrap();
        // 4 speech frames plus 3 frames of trailing pause
        assert_eq!(phrase.len(), FRAME * 7);
        assert!(phrase[..FRAME * 4].iter().all(|s| *s == 0.5));
    }

    #[test]
    fn test_record_phrase_silence_is_none() {
        let mut source = VecSource::new(frames(0.0, 50), 777);
        assert!(record_phrase(&mut source, config()).unwrap().is_none());
    }

    #[test]
    fn test_record_phrase_source_ends_mid_phrase() {
        let mut samples = frames(0.5, 3);
        samples.extend(vec![0.5; 10]);
        let mut source = VecSource::new(samples, 500);
        let phrase = record_phrase(&mut source, config()).unwrap().unwrap();
        assert_eq!(phrase.len(), FRAME * 3 + 10);
    }

    #[test]
    fn test_samples_to_wav_roundtrip_header() {
        let wav = samples_to_wav(&[0.0, 0.5, -0.5], SAMPLE_RATE).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.len(), 3);
    }

    #[test]
    fn test_wav_file_source_downmixes_stereo() {
        let dir = temp_dir();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut source = WavFileSource::open(&path).unwrap();
        assert_eq!(source.sample_rate(), 8000);
        let chunk = source.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.len(), 100);
        assert!((chunk[0] - 0.25).abs() < 1e-3);
        assert!(source.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_stream_buffer_returns_pushed_samples() {
        let mut source = StreamBuffer::new(SAMPLE_RATE, Duration::from_secs(5));
        source.sink().lock().unwrap().extend_from_slice(&[0.1, 0.2]);
        assert_eq!(source.next_chunk().unwrap(), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn test_stream_buffer_silent_device_times_out() {
        let mut source = StreamBuffer::new(SAMPLE_RATE, Duration::from_millis(60));
        let started = Instant::now();
        let err = source.next_chunk().unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(matches!(
            err.downcast_ref::<ConversaiError>(),
            Some(ConversaiError::Audio(_))
        ));
    }

    #[test]
    fn test_stream_buffer_stalled_device_ends_recording() {
        let mut source = StreamBuffer::new(SAMPLE_RATE, Duration::from_millis(60));
        source.sink().lock().unwrap().extend(frames(0.5, 3));

        // speech started, then the device went quiet
        let phrase = record_phrase(&mut source, config()).unwrap().unwrap();
        assert_eq!(phrase.len(), FRAME * 3);
    }

    #[test]
    fn test_capture_budget_adds_timeouts() {
        assert_eq!(capture_budget(config()), Duration::from_secs(3));
    }

    #[test]
    fn test_wav_file_source_missing_file() {
        let err = InputSource::WavFile(PathBuf::from("/nonexistent/q.wav"))
            .open(config())
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<ConversaiError>(),
            Some(ConversaiError::Audio(_))
        ));
    }
}
