/// Sound cues: short procedural tones through rodio.
///
/// Cues are synthesized once at startup as raw mono sample buffers and
/// played fire-and-forget through detached sinks; nothing waits on a server
/// round-trip. Without the "sound" feature the engine is a silent stub.

#[cfg(feature = "sound")]
mod inner {
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const RATE: u32 = 32000;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        cue_move: Vec<f32>,
        cue_link_up: Vec<f32>,
        cue_link_down: Vec<f32>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            Some(SoundEngine {
                _stream: stream,
                handle,
                cue_move: tone(&[(880.0, 0.03)], 0.18),
                // E5 then B5 up, a low sweep down.
                cue_link_up: tone(&[(659.3, 0.07), (987.8, 0.07)], 0.22),
                cue_link_down: slide(520.0, 180.0, 0.18, 0.22),
            })
        }

        fn play(&self, samples: &[f32]) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                sink.append(SamplesBuffer::new(1, RATE, samples.to_vec()));
                sink.detach();
            }
        }

        /// Tick on each forwarded move.
        pub fn play_move(&self) {
            self.play(&self.cue_move);
        }

        /// Link came up.
        pub fn play_link_up(&self) {
            self.play(&self.cue_link_up);
        }

        /// Link dropped.
        pub fn play_link_down(&self) {
            self.play(&self.cue_link_down);
        }
    }

    /// Concatenated square-wave notes, each (frequency, seconds), with a
    /// linear fade per note.
    fn tone(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, secs) in notes {
            let n = (RATE as f32 * secs) as usize;
            for i in 0..n {
                let t = i as f32 / RATE as f32;
                let wave = if (t * freq).fract() < 0.5 { 1.0 } else { -1.0 };
                let fade = 1.0 - i as f32 / n as f32;
                out.push(wave * fade * volume);
            }
        }
        out
    }

    /// Square-wave sweep from `from` to `to` Hz. Phase accumulates so the
    /// pitch glides instead of stepping.
    fn slide(from: f32, to: f32, secs: f32, volume: f32) -> Vec<f32> {
        let n = (RATE as f32 * secs) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let k = i as f32 / n as f32;
                let freq = from + (to - from) * k;
                phase = (phase + freq / RATE as f32).fract();
                let wave = if phase < 0.5 { 1.0 } else { -1.0 };
                wave * (1.0 - k) * volume
            })
            .collect()
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_move(&self) {}
    pub fn play_link_up(&self) {}
    pub fn play_link_down(&self) {}
}
