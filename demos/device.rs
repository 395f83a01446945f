// Coprocessor-side demo: a simulated light sensor behind the dispatch
// loop. Creates the shared region, registers its command set, and polls
// until Ctrl-C.
//
// Run this first, then `cargo run --example host` from another terminal.
use iop_mbox::Dispatch::{run_logged, DispatchLoop, HandlerTable};
use iop_mbox::Core::delay::SleepDelay;
use iop_mbox::Mbox::Structs::Command_Structs::Command;
use iop_mbox::Mbox::{Iop, MailboxBuilder};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const REGION_NAME: &str = "iop_mbox_demo";

const OP_CONFIG: u32 = 0x1;
const OP_READ: u32 = 0x2;
const OP_READ_FLOAT: u32 = 0x3;
const OP_READ_AND_LOG: u32 = 0x4;
const OP_STOP: u32 = 0x5;

/// Simulated ambient light sensor: a slow triangle wave plus gain.
struct LightSensor {
    delay: SleepDelay,
    gain: u32,
    phase: u32,
}

impl LightSensor {
    fn new() -> Self {
        Self {
            delay: SleepDelay,
            gain: 1,
            phase: 0,
        }
    }

    fn sample(&mut self) -> u32 {
        self.phase = (self.phase + 1) % 200;
        let raw = if self.phase < 100 {
            self.phase
        } else {
            200 - self.phase
        };
        raw * self.gain
    }
}

fn config(dev: &mut LightSensor, iop: &Iop, _cmd: Command) -> io::Result<()> {
    dev.gain = iop.read_param(0)?.max(1);
    log::info!("gain set to {}", dev.gain);
    Ok(())
}

fn read_once(dev: &mut LightSensor, iop: &Iop, _cmd: Command) -> io::Result<()> {
    let v = dev.sample();
    iop.write_result(0, v)
}

fn read_once_float(dev: &mut LightSensor, iop: &Iop, _cmd: Command) -> io::Result<()> {
    let v = dev.sample();
    iop.write_result_float(0, v as f32 / 100.0)
}

fn read_and_log(dev: &mut LightSensor, iop: &Iop, _cmd: Command) -> io::Result<()> {
    let max_samples = iop.read_param(0)? as usize;
    let interval_ms = iop.read_param(1)?;
    let mut log = iop.log_session(max_samples, 4, 1)?;
    iop.clear_command();
    log::info!(
        "logging session: {} samples max, {} ms interval",
        log.capacity(),
        interval_ms
    );

    let gain = dev.gain;
    let mut phase = dev.phase;
    let result = run_logged(iop, &mut log, &mut dev.delay, interval_ms, |log| {
        phase = (phase + 1) % 200;
        let raw = if phase < 100 { phase } else { 200 - phase };
        log.push_back_u32(raw * gain)
    });
    dev.phase = phase;
    log::info!(
        "session over: {} pushed, {} dropped",
        log.pushed(),
        log.dropped()
    );
    result
}

fn stop(_dev: &mut LightSensor, _iop: &Iop, _cmd: Command) -> io::Result<()> {
    Ok(())
}

fn main() -> io::Result<()> {
    env_logger::init();

    let iop = MailboxBuilder::new().with_name(REGION_NAME).build_iop()?;
    println!("Device up, region /dev/shm/{}", REGION_NAME);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nShutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let table = HandlerTable::new()
        .register(OP_CONFIG, config)
        .register(OP_READ, read_once)
        .register(OP_READ_FLOAT, read_once_float)
        .register(OP_READ_AND_LOG, read_and_log)
        .register(OP_STOP, stop);

    let mut dispatch = DispatchLoop::new(iop, table, LightSensor::new());
    dispatch.run_until(&running);

    std::fs::remove_file(format!("/dev/shm/{}", REGION_NAME)).ok();
    println!("Device stopped.");
    Ok(())
}
