use pretty_assertions::assert_eq;

use wsic_rs::{assemble, load, load_bytes, encode_program, Bus, LinearMemory, LoadError, Record};

const PROGRAM: &str = "\
TEST   START  1000
FIRST  LDCH   C1
       WD
       RSUB
C1     BYTE   c'*'
       END    FIRST
";

#[test]
fn relocation_moves_code_and_entry_point() {
    let records = assemble(PROGRAM).unwrap();

    let mut at_zero = LinearMemory::new(0x4000);
    let p0 = load(&mut at_zero, &records, 0).unwrap();
    assert_eq!(p0.exec_address, 0x1000);
    assert_eq!(p0.origin, 0x1000);
    assert_eq!(p0.terminal_address, 0x100A);
    assert_eq!(at_zero.read_u16(0x1001).unwrap(), 0x1009);

    let mut moved = LinearMemory::new(0x4000);
    let p1 = load(&mut moved, &records, 0x2000).unwrap();
    assert_eq!(p1.name, "TEST");
    assert_eq!(p1.exec_address - p0.exec_address, 0x2000);
    assert_eq!(p1.terminal_address, 0x300A);
    assert_eq!(moved.read_u16(0x3001).unwrap(), 0x3009);
    assert_eq!(moved.read_u8(0x3009).unwrap(), b'*');
    // Non-symbolic words are copied untouched.
    assert_eq!(&moved.mem[0x3003..0x3009], &[0x15, 0, 0, 0x13, 0, 0]);
}

#[test]
fn load_from_object_image() {
    let image = encode_program(&assemble(PROGRAM).unwrap()).unwrap();
    let mut mem = LinearMemory::new(0x2000);
    let prog = load_bytes(&mut mem, &image, 0x100).unwrap();
    assert_eq!(prog.exec_address, 0x1100);
    assert_eq!(&mem.mem[0x1100..0x1103], &[0x01, 0x09, 0x11]);
}

#[test]
fn modification_length_is_honoured() {
    let records = vec![
        Record::Header { name: "W".into(), start: 0, length: 3 },
        Record::Text { start: 0, payload: vec![0xFF, 0xFF, 0x00] },
        Record::Modification { address: 0, length: 3 },
        Record::End { exec: 0 },
    ];
    let mut mem = LinearMemory::new(0x20000);
    load(&mut mem, &records, 0x10000).unwrap();
    assert_eq!(mem.read_u24(0x10000).unwrap(), 0x01FFFF);
}

#[test]
fn header_must_come_first() {
    let records = vec![
        Record::Text { start: 0, payload: vec![0x16, 0, 0] },
        Record::End { exec: 0 },
    ];
    let err = load(&mut LinearMemory::new(16), &records, 0).unwrap_err();
    assert!(matches!(err, LoadError::MissingHeader { kind: "text" }), "{err}");
}

#[test]
fn second_header_is_rejected() {
    let header = Record::Header { name: "A".into(), start: 0, length: 0 };
    let records = vec![header.clone(), header, Record::End { exec: 0 }];
    let err = load(&mut LinearMemory::new(16), &records, 0).unwrap_err();
    assert!(matches!(err, LoadError::DuplicateHeader), "{err}");
}

#[test]
fn end_record_is_required() {
    let records = vec![Record::Header { name: "A".into(), start: 0, length: 3 }];
    let err = load(&mut LinearMemory::new(16), &records, 0).unwrap_err();
    assert!(matches!(err, LoadError::MissingEnd), "{err}");
}

#[test]
fn program_must_fit_in_memory() {
    let records = vec![
        Record::Header { name: "BIG".into(), start: 0x10, length: 0x10 },
        Record::End { exec: 0x10 },
    ];
    let err = load(&mut LinearMemory::new(0x20), &records, 1).unwrap_err();
    assert!(matches!(err, LoadError::TooLarge { end: 0x21, size: 0x20, .. }), "{err}");
    assert!(load(&mut LinearMemory::new(0x20), &records, 0).is_ok());
}

#[test]
fn records_after_end_are_ignored() {
    let records = vec![
        Record::Header { name: "A".into(), start: 0, length: 3 },
        Record::End { exec: 0 },
        Record::Text { start: 0, payload: vec![0xAA] },
    ];
    let mut mem = LinearMemory::new(16);
    load(&mut mem, &records, 0).unwrap();
    assert_eq!(mem.mem[0], 0);
}

#[test]
fn relocation_keeps_the_indexed_bit() {
    let records = assemble("P START 0100\nTOP LDCH TOP,X\n  END\n").unwrap();
    let mut mem = LinearMemory::new(0x2000);
    load(&mut mem, &records, 0x1000).unwrap();
    assert_eq!(mem.read_u16(0x1101).unwrap(), 0x9100);
}

#[test]
fn relocation_past_the_address_field_is_rejected() {
    let records = assemble(PROGRAM).unwrap();

    let mut mem = LinearMemory::default();
    let prog = load(&mut mem, &records, 0x6000).unwrap();
    assert_eq!(mem.read_u16(0x7001).unwrap(), 0x7009);
    assert_eq!(prog.exec_address, 0x7000);

    for base in [0x7000, 0x8000, 0x10000] {
        let err = load(&mut LinearMemory::default(), &records, base).unwrap_err();
        assert!(
            matches!(err, LoadError::RelocationOverflow { addr, limit: 0x7FFF, .. } if addr == base + 0x1001),
            "{base:#x}: {err}"
        );
    }
}

#[test]
fn relocation_past_a_wide_field_is_rejected() {
    let records = vec![
        Record::Header { name: "W".into(), start: 0, length: 3 },
        Record::Text { start: 0, payload: vec![0xFF, 0xFF, 0xFF] },
        Record::Modification { address: 0, length: 3 },
        Record::End { exec: 0 },
    ];
    let err = load(&mut LinearMemory::new(16), &records, 1).unwrap_err();
    assert!(matches!(err, LoadError::RelocationOverflow { addr: 1, value: 0x1000000, limit: 0xFFFFFF }), "{err}");
}
