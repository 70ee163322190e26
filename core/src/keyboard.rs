use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Number of keys on the hexadecimal keypad.
pub const KEY_COUNT: usize = 16;

/// What the CPU needs from an input device.
pub trait Keypad: Send + Sync {
    /// Whether `key` is currently held. Keys outside 0..F are never pressed.
    fn is_pressed(&self, key: u8) -> bool;

    /// Blocks until some key is held and returns the lowest such key.
    fn wait_for_key_press(&self) -> u8;
}

/// # Keyboard
/// The pressed status of the 16 keys 0..F.
///
/// Key transitions arrive from the host's input thread while the CPU queries or waits on the
/// same table from its own thread. The table has its own lock, separate from the machine state,
/// so a CPU parked in `wait_for_key_press` never blocks delivery of the key it is waiting for.
pub struct Keyboard {
    keys: Mutex<[bool; KEY_COUNT]>,
    changed: Condvar,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            keys: Mutex::new([false; KEY_COUNT]),
            changed: Condvar::new(),
        }
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was pressed
    pub fn press(&self, key: u8) {
        self.set(key, true);
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was released
    pub fn release(&self, key: u8) {
        self.set(key, false);
    }

    /// Releases every key.
    pub fn clear(&self) {
        *self.lock() = [false; KEY_COUNT];
    }

    fn set(&self, key: u8, pressed: bool) {
        let mut keys = self.lock();
        if let Some(slot) = keys.get_mut(key as usize) {
            *slot = pressed;
            self.changed.notify_all();
        } else {
            log::warn!("ignoring transition of unknown key {:#04X}", key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, [bool; KEY_COUNT]> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn first_pressed(keys: &[bool; KEY_COUNT]) -> Option<u8> {
    keys.iter().position(|&pressed| pressed).map(|key| key as u8)
}

impl Keypad for Keyboard {
    fn is_pressed(&self, key: u8) -> bool {
        self.lock().get(key as usize).copied().unwrap_or(false)
    }

    fn wait_for_key_press(&self) -> u8 {
        let mut keys = self.lock();
        loop {
            if let Some(key) = first_pressed(&keys) {
                return key;
            }
            keys = self
                .changed
                .wait(keys)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}
