use super::*;
use crate::n64_byteorder::{MAGIC_V64, MAGIC_Z64, N64Format, normalize_to_big_endian};

/// Build a z64 (big-endian) header-only ROM.
fn make_z64() -> Vec<u8> {
    let mut rom = vec![0u8; 0x1000];
    rom[0..4].copy_from_slice(&MAGIC_Z64);
    rom[0x10..0x14].copy_from_slice(&0xDEADBEEFu32.to_be_bytes());
    rom[0x14..0x18].copy_from_slice(&0xCAFEBABEu32.to_be_bytes());
    let title = b"SUPER MARIO 64      ";
    rom[0x20..0x34].copy_from_slice(title);
    rom[0x3B] = b'N';
    rom[0x3C] = b'S';
    rom[0x3D] = b'M';
    rom[0x3E] = b'E';
    rom[0x3F] = 0;
    rom
}

/// Convert a z64 buffer to v64 (16-bit swapped) order.
fn to_v64(rom: &[u8]) -> Vec<u8> {
    let mut out = rom.to_vec();
    for pair in out.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
    out
}

/// Convert a z64 buffer to n64 (little-endian) order.
fn to_n64(rom: &[u8]) -> Vec<u8> {
    let mut out = rom.to_vec();
    for word in out.chunks_exact_mut(4) {
        word.swap(0, 3);
        word.swap(1, 2);
    }
    out
}

#[test]
fn parses_z64() {
    let rom = make_z64();
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.title, "SUPER MARIO 64");
    assert_eq!(info.category_code, 'N');
    assert_eq!(info.game_id, "SM");
    assert_eq!(info.destination_code, 'E');
    assert_eq!(info.serial(), "NUS-NSME-USA");
    assert_eq!(info.region, Region::Usa);
    assert_eq!(info.crc1, 0xDEADBEEF);
    assert_eq!(info.crc2, 0xCAFEBABE);
    assert_eq!(info.platform(), Platform::N64);
}

#[test]
fn v64_and_n64_orders_normalize_to_same_header() {
    let z64 = make_z64();
    let base = parse(&z64.as_slice(), z64.len() as u64).unwrap();

    let v64 = to_v64(&z64);
    let swapped = parse(&v64.as_slice(), v64.len() as u64).unwrap();
    assert_eq!(swapped.title, base.title);
    assert_eq!(swapped.serial(), base.serial());
    assert_eq!(swapped.crc1, base.crc1);
    assert_eq!(swapped.format, "v64 (byte-swapped)");

    let n64 = to_n64(&z64);
    let little = parse(&n64.as_slice(), n64.len() as u64).unwrap();
    assert_eq!(little.title, base.title);
    assert_eq!(little.serial(), base.serial());
    assert_eq!(little.format, "n64 (little-endian)");
}

#[test]
fn v64_magic_detected() {
    let z64 = make_z64();
    let v64 = to_v64(&z64);
    assert_eq!(&v64[0..4], &MAGIC_V64);
}

#[test]
fn unknown_magic_is_invalid() {
    let mut rom = make_z64();
    rom[0] = 0x00;
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn japanese_destination() {
    let mut rom = make_z64();
    rom[0x3E] = b'J';
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.region, Region::Japan);
    assert_eq!(info.serial(), "NUS-NSMJ-JPN");
}

#[test]
fn normalize_helper_is_involutive_on_magic() {
    let mut magic = MAGIC_V64;
    normalize_to_big_endian(&mut magic, N64Format::V64);
    assert_eq!(magic, MAGIC_Z64);
}
