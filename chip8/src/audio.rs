use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

/// Pitch of the beep.
const TONE_HZ: f32 = 226.0;

/// # Tone
/// A square wave that only sounds while its gate is open.
///
/// The CPU opens and closes the gate from its timer thread; SDL reads it from the audio thread.
pub struct Tone {
    gate: Arc<AtomicBool>,
    phase_inc: f32,
    phase: f32,
    volume: f32,
}

impl AudioCallback for Tone {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        if !self.gate.load(Ordering::Acquire) {
            out.fill(0.0);
            return;
        }

        for sample in out.iter_mut() {
            *sample = if self.phase < 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

/// Opens and starts the audio device that plays the tone behind `gate`.
///
/// # Arguments
/// * `sdl` an sdl2 context
/// * `gate` the shared flag the CPU raises while its sound timer runs
/// * `volume` amplitude between 0 and 1
pub fn open(sdl: &sdl2::Sdl, gate: Arc<AtomicBool>, volume: f32) -> Result<AudioDevice<Tone>, String> {
    let audio_subsystem = sdl.audio()?;
    let desired = AudioSpecDesired {
        freq: Some(44_100),
        channels: Some(1),
        samples: None,
    };

    let device = audio_subsystem.open_playback(None, &desired, |spec| Tone {
        gate,
        phase_inc: TONE_HZ / spec.freq as f32,
        phase: 0.0,
        volume: volume.clamp(0.0, 1.0),
    })?;
    device.resume();
    Ok(device)
}
