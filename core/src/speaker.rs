use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Something that can play the Chip-8's single tone.
///
/// The CPU only calls these on transitions of the sound timer between zero and non-zero.
pub trait Speaker: Send {
    fn start_beep(&mut self);
    fn end_beep(&mut self);
}

/// A speaker that makes no sound.
#[derive(Default)]
pub struct Mute;

impl Speaker for Mute {
    fn start_beep(&mut self) {}

    fn end_beep(&mut self) {}
}

/// A shared gate that some audio callback reads to decide whether to output the tone.
impl Speaker for Arc<AtomicBool> {
    fn start_beep(&mut self) {
        self.store(true, Ordering::Release);
    }

    fn end_beep(&mut self) {
        self.store(false, Ordering::Release);
    }
}
