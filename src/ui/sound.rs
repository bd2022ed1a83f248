/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_step_map: Arc<Vec<u8>>,
        sfx_encounter: Arc<Vec<u8>>,
        sfx_boss: Arc<Vec<u8>>,
        sfx_hit: Arc<Vec<u8>>,
        sfx_victory: Arc<Vec<u8>>,
        sfx_ending: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_step_map: Arc::new(make_wav(&gen_blip(660.0, 0.06, 0.2))),
                sfx_encounter: Arc::new(make_wav(&gen_encounter())),
                sfx_boss: Arc::new(make_wav(&gen_boss())),
                sfx_hit: Arc::new(make_wav(&gen_hit())),
                sfx_victory: Arc::new(make_wav(&gen_arpeggio(&[523.0, 659.0, 784.0], 0.08))),
                sfx_ending: Arc::new(make_wav(&gen_arpeggio(&[523.0, 659.0, 784.0, 1047.0, 1319.0], 0.14))),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_map_enter(&self) { self.play(&self.sfx_step_map); }
        pub fn play_encounter(&self) { self.play(&self.sfx_encounter); }
        pub fn play_boss(&self) { self.play(&self.sfx_boss); }
        pub fn play_hit(&self) { self.play(&self.sfx_hit); }
        pub fn play_victory(&self) { self.play(&self.sfx_victory); }
        pub fn play_ending(&self) { self.play(&self.sfx_ending); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn tone(freq: f32, i: usize) -> f32 {
        (i as f32 / SAMPLE_RATE as f32 * freq * 2.0 * PI).sin()
    }

    /// Simple sine blip with linear fade out
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| tone(freq, i) * (1.0 - i as f32 / n as f32) * volume)
            .collect()
    }

    /// Encounter: rapid alternating two-tone alarm
    fn gen_encounter() -> Vec<f32> {
        let mut samples = Vec::new();
        for k in 0..6 {
            let freq = if k % 2 == 0 { 880.0 } else { 660.0 };
            samples.extend(gen_blip(freq, 0.05, 0.25));
        }
        samples
    }

    /// Boss: low rumble sliding down with a square-ish edge
    fn gen_boss() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.6) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 160.0 - t * 80.0;
                let wave = tone(freq, i) * 0.7 + tone(freq * 3.0, i) * 0.3;
                wave * (1.0 - t).powf(0.4) * 0.35
            })
            .collect()
    }

    /// Hit: short noise burst over a falling tone
    fn gen_hit() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.09) as usize;
        let mut rng: u32 = 0x2545_F491;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let body = tone(300.0 - t * 200.0, i);
                (body * 0.5 + noise * 0.5) * (1.0 - t) * 0.3
            })
            .collect()
    }

    /// Ascending arpeggio with a held final note (victory / ending)
    fn gen_arpeggio(notes: &[f32], note_dur: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = tone(freq, i) * 0.7 + tone(freq * 2.0, i) * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        if let Some(&last) = notes.last() {
            samples.extend(gen_blip(last, 0.25, 0.3));
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_sample_count() {
            let samples = gen_hit();
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
        }

        #[test]
        fn generators_stay_within_unit_range() {
            for buf in [gen_encounter(), gen_boss(), gen_hit(), gen_arpeggio(&[523.0, 784.0], 0.05)] {
                assert!(!buf.is_empty());
                assert!(buf.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_map_enter(&self) {}
    pub fn play_encounter(&self) {}
    pub fn play_boss(&self) {}
    pub fn play_hit(&self) {}
    pub fn play_victory(&self) {}
    pub fn play_ending(&self) {}
}
