// Host-side demo: drives the device demo through its whole command set —
// configure, a few single-shot reads, then a one-second logging session
// drained at the end.
//
// Start `cargo run --example device` first.
use iop_mbox::Mbox::MailboxBuilder;
use std::io;
use std::thread;
use std::time::Duration;

const REGION_NAME: &str = "iop_mbox_demo";

const OP_CONFIG: u32 = 0x1;
const OP_READ: u32 = 0x2;
const OP_READ_FLOAT: u32 = 0x3;
const OP_READ_AND_LOG: u32 = 0x4;
const OP_STOP: u32 = 0x5;

const LOG_CAPACITY: usize = 64;

fn main() -> io::Result<()> {
    env_logger::init();

    // the device boots first and creates the region; retry while it comes up
    let host = loop {
        match MailboxBuilder::new().with_name(REGION_NAME).build_host() {
            Ok(host) => break host,
            Err(e) => {
                println!("Waiting for device ({})...", e);
                thread::sleep(Duration::from_millis(500));
            }
        }
    };
    println!("Attached to /dev/shm/{}", REGION_NAME);

    host.issue_with_params(OP_CONFIG, &[2])?;
    host.wait_complete_timeout(Duration::from_secs(2))?;
    println!("Configured, status {:?}", host.status());

    for _ in 0..3 {
        host.issue_wait(OP_READ)?;
        println!("reading: {}", host.read_result(0)?);
    }
    host.issue_wait(OP_READ_FLOAT)?;
    println!("normalized: {:.2}", host.read_result_float(0)?);

    println!("Logging for 1s at 10ms intervals...");
    host.issue_with_params(OP_READ_AND_LOG, &[LOG_CAPACITY as u32, 10])?;
    thread::sleep(Duration::from_secs(1));
    host.issue(OP_STOP)?;
    host.wait_complete_timeout(Duration::from_secs(2))?;

    let samples = host.drain_log_u32(LOG_CAPACITY)?;
    println!(
        "drained {} samples ({} pushed, {} overwritten), status {:?}",
        samples.len(),
        host.log_pushed(),
        host.dropped_records(LOG_CAPACITY, 1),
        host.status()
    );
    if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
        println!("oldest {} ... newest {} (live {})", first, last, host.last_value());
    }

    Ok(())
}
