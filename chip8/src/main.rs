use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::Parser;

use chip8_core::constants::CLOCK_SPEED;

mod audio;
mod keymap;
mod run;

#[derive(Parser, Debug)]
#[command(version, about = "A Chip-8 interpreter", long_about = None)]
struct Args {
    #[arg(help = "ROM file to run")]
    rom: PathBuf,

    #[arg(long, default_value_t = NonZeroU32::new(CLOCK_SPEED).unwrap_or(NonZeroU32::MIN), help = "Instructions per second")]
    hz: NonZeroU32,

    #[arg(long, default_value_t = 10, help = "Window pixels per Chip-8 pixel")]
    scale: u32,

    #[arg(long, default_value_t = 0.5, help = "Beep volume between 0 and 1")]
    volume: f32,

    #[arg(long, help = "Start with the breakpoint armed; press N to step and P to resume")]
    paused: bool,

    #[arg(long, help = "Log every executed instruction")]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.trace {
        logger.filter_module("chip8_core", log::LevelFilter::Trace);
    }
    logger.init();

    run::run(&run::Options {
        rom: args.rom,
        cpu_hz: args.hz,
        scale: args.scale.max(1),
        volume: args.volume.clamp(0.0, 1.0),
        start_paused: args.paused,
    })
}
