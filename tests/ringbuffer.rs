use iop_mbox::Core::delay::ManualDelay;
use iop_mbox::Dispatch::run_logged;
use iop_mbox::Mbox::Buffer::layout::{LOG_START_WORD, WORD_BYTES};
use iop_mbox::Mbox::MailboxBuilder;

const LOG_START_OFFSET: usize = LOG_START_WORD * WORD_BYTES;

#[test]
fn overwrite_keeps_most_recent_capacity() {
    // capacity 10, 15 single-word pushes: the drain must yield exactly the
    // last 10 samples in insertion order
    let (host, iop) = MailboxBuilder::new().build_pair().unwrap();
    let mut log = iop.log_session(10, 4, 1).unwrap();

    for i in 0u32..15 {
        log.push_back_u32(i).unwrap();
    }

    assert_eq!(log.len(), 10);
    assert_eq!(log.pushed(), 15);
    assert_eq!(log.dropped(), 5);

    let drained = host.drain_log_u32(10).unwrap();
    assert_eq!(drained, vec![5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
    assert_eq!(host.dropped_records(10, 1), 5);
}

#[test]
fn overwrite_property_random_overrun() {
    // push capacity + k and expect [k, k+capacity) for a spread of k
    for _ in 0..20 {
        let capacity = fastrand::usize(2..64);
        let k = fastrand::u32(0..100);

        let (host, iop) = MailboxBuilder::new().build_pair().unwrap();
        let mut log = iop.log_session(capacity, 4, 1).unwrap();
        for i in 0..capacity as u32 + k {
            log.push_back_u32(i).unwrap();
        }

        let drained = host.drain_log_u32(capacity).unwrap();
        let expected: Vec<u32> = (k..k + capacity as u32).collect();
        assert_eq!(drained, expected, "capacity {} k {}", capacity, k);
    }
}

#[test]
fn capacity_is_channel_aligned() {
    let (_host, iop) = MailboxBuilder::new().build_pair().unwrap();
    for max_samples in [1usize, 3, 10, 100, 999, 1000] {
        for channels in 1usize..=5 {
            match iop.log_session(max_samples, 4, channels) {
                Ok(log) => {
                    assert_eq!(log.capacity() % channels, 0);
                    assert!(log.capacity() <= max_samples);
                }
                // max_samples below the channel count leaves no room for a
                // single frame; init must refuse rather than misalign
                Err(_) => assert!(max_samples < channels),
            }
        }
    }
}

#[test]
fn capacity_rounds_down_to_channel_multiple() {
    let (_host, iop) = MailboxBuilder::new().build_pair().unwrap();
    let log = iop.log_session(1000, 4, 3).unwrap();
    assert_eq!(log.capacity(), 999);
}

#[test]
fn wrap_exactly_at_capacity() {
    let (_host, iop) = MailboxBuilder::new().build_pair().unwrap();
    let mut log = iop.log_session(8, 4, 1).unwrap();

    for i in 0u32..8 {
        log.push_back_u32(i).unwrap();
    }
    // cumulative byte size equals capacity * item_size: tail is back at the
    // buffer start
    assert_eq!(log.tail_offset(), LOG_START_OFFSET);
    assert_eq!(log.len(), 8);

    // the next push stays in bounds and overwrites the oldest record
    log.push_back_u32(8).unwrap();
    assert_eq!(log.tail_offset(), LOG_START_OFFSET + WORD_BYTES);
    assert_eq!(log.head_offset(), LOG_START_OFFSET + WORD_BYTES);
    assert_eq!(log.len(), 8);
}

#[test]
fn init_publishes_sentinel_and_cursors() {
    let (host, iop) = MailboxBuilder::new().build_pair().unwrap();
    let log = iop.log_session(10, 4, 1).unwrap();

    assert_eq!(host.last_value(), 0xFFFF_FFFF);
    assert_eq!(host.log_pushed(), 0);
    assert_eq!(log.head_offset(), LOG_START_OFFSET);
    assert_eq!(log.tail_offset(), LOG_START_OFFSET);
    assert!(host.drain_log_u32(10).unwrap().is_empty());
}

#[test]
fn stop_before_first_sample_captures_nothing() {
    // "start logging" followed immediately by another command: the session
    // ends with no samples and the cursors still at the buffer start
    let (host, iop) = MailboxBuilder::new().build_pair().unwrap();

    host.issue_with_params(0x4, &[]).unwrap();
    let _cmd = iop.poll_command().unwrap();
    let mut log = iop.log_session(100, 4, 1).unwrap();
    iop.clear_command();

    // the stop lands before the loop takes its first sample
    host.issue(0x1).unwrap();

    let mut delay = ManualDelay::default();
    let mut samples = 0u32;
    run_logged(&iop, &mut log, &mut delay, 1, |log| {
        samples += 1;
        log.push_back_u32(samples)
    })
    .unwrap();

    assert_eq!(samples, 0);
    assert!(log.is_empty());
    assert_eq!(log.head_offset(), LOG_START_OFFSET);
    assert_eq!(log.tail_offset(), LOG_START_OFFSET);
    assert_eq!(delay.elapsed_us, 0);
    assert!(host.drain_log_u32(100).unwrap().is_empty());
}

#[test]
fn multi_channel_overwrite_stays_frame_aligned() {
    let (host, iop) = MailboxBuilder::new().build_pair().unwrap();
    let mut log = iop.log_session(10, 4, 3).unwrap();
    assert_eq!(log.capacity(), 9);

    // 12 interleaved records = 4 frames of 3 channels
    for i in 0u32..12 {
        log.push_back_u32(i).unwrap();
    }
    // one whole frame was discarded, so the drain starts on a frame boundary
    assert_eq!(log.dropped(), 3);
    assert_eq!(host.dropped_records(9, 3), 3);
    let drained = host.drain_log_u32(9).unwrap();
    assert_eq!(drained, vec![3, 4, 5, 6, 7, 8, 9, 10, 11]);
}

#[test]
fn host_drop_count_is_frame_granular() {
    // overrunning a 3-channel ring by a single record still costs a whole
    // frame; the host estimate must agree with the ring's own counter
    let (host, iop) = MailboxBuilder::new().build_pair().unwrap();
    let mut log = iop.log_session(9, 4, 3).unwrap();

    for i in 0u32..10 {
        log.push_back_u32(i).unwrap();
    }
    assert_eq!(log.dropped(), 3);
    assert_eq!(host.dropped_records(9, 3), 3);

    // three more pushes refill the freed frame before the next discard
    for i in 10u32..13 {
        log.push_back_u32(i).unwrap();
    }
    assert_eq!(log.dropped(), 6);
    assert_eq!(host.dropped_records(9, 3), 6);
}

#[test]
fn float_records_roundtrip_through_the_log() {
    let (host, iop) = MailboxBuilder::new().build_pair().unwrap();
    let mut log = iop.log_session(16, 4, 1).unwrap();

    let samples: Vec<f32> = (0..10).map(|i| i as f32 * 0.33).collect();
    for &v in &samples {
        log.push_back_float(v).unwrap();
    }

    assert_eq!(host.drain_log_floats(16).unwrap(), samples);
    assert_eq!(host.last_value_float(), samples[9]);
}

#[test]
fn multi_word_records() {
    let (_host, iop) = MailboxBuilder::new().build_pair().unwrap();
    let mut log = iop.log_session(4, 8, 1).unwrap();

    log.push_back(&[1, 0, 0, 0, 2, 0, 0, 0]).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log.tail_offset(), LOG_START_OFFSET + 8);

    // a record of the wrong size must be refused
    assert!(log.push_back(&[1, 2, 3, 4]).is_err());
    // as must the single-word convenience on a two-word session
    assert!(log.push_back_u32(7).is_err());
}

#[test]
fn init_rejects_bad_geometry() {
    let (_host, iop) = MailboxBuilder::new().build_pair().unwrap();

    // zero capacity
    assert!(iop.log_session(0, 4, 1).is_err());
    assert!(iop.log_session(2, 4, 3).is_err());
    // item size not a word multiple
    assert!(iop.log_session(10, 3, 1).is_err());
    assert!(iop.log_session(10, 0, 1).is_err());
    // zero channels
    assert!(iop.log_session(10, 4, 0).is_err());
    // span larger than the log region
    assert!(iop.log_session(100_000, 4, 1).is_err());
}

#[test]
fn last_value_mirrors_newest_push() {
    let (host, iop) = MailboxBuilder::new().build_pair().unwrap();
    let mut log = iop.log_session(4, 4, 1).unwrap();

    for i in 0u32..7 {
        log.push_back_u32(i * 11).unwrap();
        assert_eq!(host.last_value(), i * 11);
    }
    assert_eq!(host.log_pushed(), 7);
}
