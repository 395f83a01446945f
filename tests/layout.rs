// Layout conformance tests for the mailbox wire format.
// Both sides of the protocol (and foreign-language hosts using the cdylib)
// rely on these offsets; they assert sizes, alignments and field offsets
// and print the observed values to aid debugging on a new platform.
use crossbeam_utils::CachePadded;
use iop_mbox::Mbox::Buffer::layout::{
    region_size, MailboxLayout, RegionHeader, CMD_PENDING, DATA_WORDS, LOG_END_WORD,
    LOG_START_WORD, SLOT_STATUS, WORD_BYTES,
};
use iop_mbox::Mbox::Structs::Command_Structs::{CmdStatus, Command};
use memoffset::offset_of;
use std::mem::{align_of, size_of};
use std::sync::atomic::AtomicU32;

#[test]
fn test_mailbox_layout() {
    let data_bytes = DATA_WORDS * WORD_BYTES;
    let cmd_align = align_of::<CachePadded<AtomicU32>>();

    let size = size_of::<MailboxLayout>();
    let align = align_of::<MailboxLayout>();
    let off_data = offset_of!(MailboxLayout, data);
    let off_command = offset_of!(MailboxLayout, command);

    println!(
        "MailboxLayout => size: {size}, align: {align}, offsets: [data:{off_data}, command:{off_command}], cache-pad align: {cmd_align}"
    );

    assert_eq!(off_data, 0);
    // command word sits right past the data block, at its padding alignment
    let expected_command = (data_bytes + cmd_align - 1) & !(cmd_align - 1);
    assert_eq!(off_command, expected_command);
    assert_eq!(align, 128);
    assert_eq!(size % 128, 0);
}

#[test]
fn test_region_header_layout() {
    assert_eq!(offset_of!(RegionHeader, magic), 0);
    assert_eq!(offset_of!(RegionHeader, version), 4);
    assert_eq!(offset_of!(RegionHeader, data_words), 8);
    assert_eq!(align_of::<RegionHeader>(), 128);
    // align(128) pads the header to a full stride, so the mailbox behind it
    // starts aligned
    assert_eq!(size_of::<RegionHeader>(), 128);
    assert_eq!(
        region_size(),
        size_of::<RegionHeader>() + size_of::<MailboxLayout>()
    );
}

#[test]
fn test_reserved_slot_map() {
    // words 0..4 are live-pointer/count slots, the log region runs up to
    // the status slot carved out of the end
    assert_eq!(LOG_START_WORD, 4);
    assert_eq!(SLOT_STATUS, DATA_WORDS - 1);
    assert_eq!(LOG_END_WORD, SLOT_STATUS);
}

#[test]
fn test_command_word_encoding() {
    // bit 0 is the pending flag, opcode in the remaining bits
    assert_eq!(Command::encode(0), 0x1);
    assert_eq!(Command::encode(0x7), 0xF);
    assert_eq!(Command::encode(0x7) & CMD_PENDING, CMD_PENDING);

    let cmd = Command::from_raw(Command::encode(0x2A)).unwrap();
    assert_eq!(cmd.opcode(), 0x2A);
    assert_eq!(cmd.raw(), 0x55);

    // a cleared word is idle, not a command
    assert!(Command::from_raw(0).is_none());
    // any even word reads as idle too; the pending bit is the whole signal
    assert!(Command::from_raw(0x54).is_none());
}

#[test]
fn test_status_word_roundtrip() {
    assert_eq!(CmdStatus::Ok.as_word(), 0);
    assert_eq!(CmdStatus::from_word(0), CmdStatus::Ok);
    assert_eq!(CmdStatus::from_word(2), CmdStatus::Timeout);
    assert_eq!(CmdStatus::from_word(1), CmdStatus::BusError);
    // unknown status words collapse to a bus error
    assert_eq!(CmdStatus::from_word(0xDEAD), CmdStatus::BusError);
}
