use std::env;
use std::fs;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chip8_core::{Config, Cpu, Fault, FrameBuffer, Keyboard, Mute, Session, StepResult};

fn write_rom(name: &str, rom: &[u8]) -> PathBuf {
    let path = env::temp_dir().join(format!("chip8-session-{}-{}.ch8", name, std::process::id()));
    fs::write(&path, rom).unwrap();
    path
}

fn load(name: &str, rom: &[u8]) -> (Arc<Cpu>, Arc<Keyboard>) {
    let keyboard = Arc::new(Keyboard::new());
    let cpu = Arc::new(Cpu::new(keyboard.clone(), Box::new(Mute)));
    let path = write_rom(name, rom);
    cpu.load_rom(&path).unwrap();
    fs::remove_file(&path).unwrap();
    (cpu, keyboard)
}

fn fast() -> Config {
    Config {
        cpu_hz: NonZeroU32::new(2000).unwrap(),
        ..Config::default()
    }
}

fn wait_for(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.cpu_hz.get(), 500);
    assert_eq!(config.timer_hz.get(), 60);
    assert!(!config.start_paused);
}

#[test]
fn test_program_runs_until_halt() {
    // V0 = 1; V0 += 2; then a zero opcode
    let (cpu, _) = load("halt", &[0x60, 0x01, 0x70, 0x02]);
    let session = Session::start(Arc::clone(&cpu), &fast()).unwrap();

    wait_for("the program to halt", || !session.is_running());
    assert_eq!(session.outcome(), Some(StepResult::Halted));
    assert_eq!(cpu.state().v[0x0], 0x03);
    assert_eq!(session.stop(), Some(StepResult::Halted));
}

#[test]
fn test_fatal_step_stops_the_clock() {
    let (cpu, _) = load("fatal", &[0x00, 0xEE]);
    let session = Session::start(cpu, &fast()).unwrap();

    wait_for("the program to fail", || !session.is_running());
    match session.stop() {
        Some(StepResult::Fatal(err)) => {
            assert_eq!(err.fault, Fault::StackUnderflow);
            assert_eq!(err.pc, 0x200);
            assert_eq!(err.opcode, 0x00EE);
        }
        other => panic!("expected a fatal outcome, got {:?}", other),
    }
}

#[test]
fn test_timers_count_down_while_looping() {
    // V0 = 0x3C; DT = V0; loop forever
    let (cpu, _) = load("timers", &[0x60, 0x3C, 0xF0, 0x15, 0x12, 0x04]);
    let session = Session::start(Arc::clone(&cpu), &fast()).unwrap();

    wait_for("the delay timer to be set", || cpu.state().pc == 0x204);
    wait_for("the delay timer to tick", || cpu.state().delay_timer < 0x3A);
    assert!(session.is_running());
    assert_eq!(session.stop(), None);
}

#[test]
fn test_paused_session_steps_on_demand() {
    let (cpu, _) = load("paused", &[0x61, 0x01, 0x62, 0x02, 0x12, 0x04]);
    let config = Config {
        start_paused: true,
        ..fast()
    };
    let session = Session::start(Arc::clone(&cpu), &config).unwrap();

    wait_for("the breakpoint", || cpu.is_waiting());
    assert_eq!(cpu.state().pc, 0x200);

    cpu.end_wait();
    wait_for("one step", || cpu.state().pc == 0x202);
    wait_for("the next breakpoint", || cpu.is_waiting());
    assert_eq!(cpu.state().pc, 0x202);
    assert_eq!(cpu.state().v[0x2], 0x00);

    cpu.set_should_wait(false);
    cpu.end_wait();
    wait_for("the loop", || cpu.state().pc == 0x204);
    assert_eq!(cpu.state().v[0x2], 0x02);
    session.stop();
}

#[test]
fn test_stop_releases_breakpoint() {
    let (cpu, _) = load("stop", &[0x12, 0x00]);
    let config = Config {
        start_paused: true,
        ..fast()
    };
    let session = Session::start(Arc::clone(&cpu), &config).unwrap();
    wait_for("the breakpoint", || cpu.is_waiting());

    assert_eq!(session.stop(), None);
    wait_for("the breakpoint to clear", || !cpu.is_waiting());
}

#[test]
fn test_stop_while_paused_executes_nothing() {
    // V1 = 7; loop
    let (cpu, _) = load("stop-paused", &[0x61, 0x07, 0x12, 0x02]);
    let config = Config {
        start_paused: true,
        ..fast()
    };
    let session = Session::start(Arc::clone(&cpu), &config).unwrap();
    wait_for("the breakpoint", || cpu.is_waiting());

    assert_eq!(session.stop(), None);
    thread::sleep(Duration::from_millis(20));
    let state = cpu.state();
    assert_eq!(state.pc, 0x200);
    assert_eq!(state.v[0x1], 0x00);
}

#[test]
fn test_dropping_session_stops_the_cpu() {
    // V0 += 1; loop
    let (cpu, _) = load("drop", &[0x70, 0x01, 0x12, 0x00]);
    let config = Config {
        cpu_hz: NonZeroU32::new(1000).unwrap(),
        ..Config::default()
    };
    let session = Session::start(Arc::clone(&cpu), &config).unwrap();
    wait_for("the program to run", || cpu.state().v[0x0] > 0);

    drop(session);
    // a step already underway may still finish
    thread::sleep(Duration::from_millis(20));
    let before = cpu.state();
    thread::sleep(Duration::from_millis(100));
    let after = cpu.state();
    assert_eq!(after.v[0x0], before.v[0x0]);
    assert_eq!(after.pc, before.pc);
}

#[test]
fn test_dropping_session_stops_the_timers() {
    // V0 = 0xFF; DT = V0; loop
    let (cpu, _) = load("drop-timers", &[0x60, 0xFF, 0xF0, 0x15, 0x12, 0x04]);
    let session = Session::start(Arc::clone(&cpu), &fast()).unwrap();
    wait_for("the delay timer to tick", || {
        let state = cpu.state();
        state.pc == 0x204 && state.delay_timer < 0xFF
    });

    drop(session);
    thread::sleep(Duration::from_millis(40));
    let before = cpu.state().delay_timer;
    thread::sleep(Duration::from_millis(100));
    assert_eq!(cpu.state().delay_timer, before);
}

#[test]
fn test_key_wait_resumes_on_press() {
    // V4 = key; draw the glyph for it at 0,0; loop
    let (cpu, keyboard) = load(
        "key",
        &[0xF4, 0x0A, 0xF4, 0x29, 0xD0, 0x05, 0x12, 0x06],
    );
    let (tx, frames) = mpsc::channel::<FrameBuffer>();
    cpu.add_render_listener(tx);
    let session = Session::start(Arc::clone(&cpu), &fast()).unwrap();

    thread::sleep(Duration::from_millis(20));
    assert_eq!(cpu.state().pc, 0x202);
    assert!(frames.try_recv().is_err());

    keyboard.press(0x1);
    let frame = frames.recv_timeout(Duration::from_secs(5)).unwrap();
    // the glyph for 1 is 0x20 0x60 0x20 0x20 0x70
    assert_eq!(frame[0][..4], [false, false, true, false]);
    assert_eq!(frame[1][..4], [false, true, true, false]);
    assert_eq!(frame[4][..4], [false, true, true, true]);
    assert_eq!(cpu.state().v[0x4], 0x01);
    session.stop();
}
