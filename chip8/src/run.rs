use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use sdl2::event::{Event, WindowEvent};

use chip8_core::{Config, Cpu, FrameBuffer, Keyboard, MachineState, Session, StepResult};
use chip8_display::Display;

use crate::audio;
use crate::keymap::{control, keymap, Control};

const FRAME_TIME: Duration = Duration::from_micros(16_667);

pub struct Options {
    pub rom: PathBuf,
    pub cpu_hz: NonZeroU32,
    pub scale: u32,
    pub volume: f32,
    pub start_paused: bool,
}

pub fn run(options: &Options) -> anyhow::Result<()> {
    // Get SDL2 context
    let sdl: sdl2::Sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let mut display = Display::new(&sdl, "Emu-8", options.scale).map_err(anyhow::Error::msg)?;
    let mut events = sdl.event_pump().map_err(anyhow::Error::msg)?;

    let gate = Arc::new(AtomicBool::new(false));
    let _audio = match audio::open(&sdl, Arc::clone(&gate), options.volume) {
        Ok(device) => Some(device),
        Err(e) => {
            log::warn!("continuing without sound: {}", e);
            None
        }
    };

    let keyboard = Arc::new(Keyboard::new());
    let cpu = Arc::new(Cpu::new(keyboard.clone(), Box::new(gate)));

    let (frame_tx, frames) = mpsc::channel::<FrameBuffer>();
    cpu.add_render_listener(frame_tx);

    // Whether steps currently stop at the breakpoint
    let paused = Arc::new(AtomicBool::new(options.start_paused));
    {
        let paused = Arc::clone(&paused);
        cpu.add_debugger_listener(move |state: &MachineState| {
            if paused.load(Ordering::Relaxed) {
                log::debug!("{}", describe(state));
            }
        });
    }

    // Load ROM
    cpu.load_rom(&options.rom)
        .with_context(|| format!("unable to load {}", options.rom.display()))?;
    log::info!("successfully loaded {}", options.rom.display());

    let session = Session::start(
        Arc::clone(&cpu),
        &Config {
            cpu_hz: options.cpu_hz,
            start_paused: options.start_paused,
            ..Config::default()
        },
    )?;

    let mut outcome: Option<StepResult> = None;
    'event: loop {
        let frame_start = Instant::now();

        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key),
                    repeat,
                    ..
                } => match (keymap(key), control(key)) {
                    (Some(kc), _) => keyboard.press(kc),
                    (_, Some(Control::Quit)) => break 'event,
                    (_, Some(Control::ToggleBreakpoint)) if !repeat => {
                        let now_paused = !paused.load(Ordering::Relaxed);
                        paused.store(now_paused, Ordering::Relaxed);
                        cpu.set_should_wait(now_paused);
                        if !now_paused {
                            cpu.end_wait();
                        }
                        log::info!("{}", if now_paused { "paused" } else { "resumed" });
                    }
                    (_, Some(Control::Step)) => cpu.end_wait(),
                    _ => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(kc) = keymap(key) {
                        keyboard.release(kc);
                    }
                }
                // Key ups are never delivered to an unfocused window
                Event::Window {
                    win_event: WindowEvent::FocusLost,
                    ..
                } => keyboard.clear(),
                _ => continue,
            };
        }

        // Only the newest frame matters
        if let Some(frame) = frames.try_iter().last() {
            display.render(&frame).map_err(anyhow::Error::msg)?;
        }

        if outcome.is_none() && !session.is_running() {
            outcome = session.outcome();
            match &outcome {
                Some(StepResult::Fatal(err)) => log::error!("program stopped: {}", err),
                _ => log::info!("program finished; press Escape to quit"),
            }
        }

        // Handle timing
        let elapsed = frame_start.elapsed();
        if FRAME_TIME > elapsed {
            std::thread::sleep(FRAME_TIME - elapsed);
        }
    }

    match session.stop() {
        Some(StepResult::Fatal(err)) => Err(err.into()),
        _ => Ok(()),
    }
}

/// One line summary of the machine for the debug log.
fn describe(state: &MachineState) -> String {
    let next = state
        .next_opcode
        .map_or_else(|| "----".to_string(), |op| format!("{:04X}", op));
    format!(
        "{:04X} (next {}) v{:02X?} i{:04X} pc{:04X} sp{} dt{:02X} st{:02X}",
        state.current_opcode,
        next,
        state.v,
        state.i,
        state.pc,
        state.sp,
        state.delay_timer,
        state.sound_timer
    )
}
