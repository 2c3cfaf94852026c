//! End-to-end: assemble a program, write it through a placement script onto
//! an RWTS16 image, and read the sector back out through the 6-and-2
//! decoder.

use merlin6502::disk::encode::decode_6_and_2;
use merlin6502::{Assembler, DiskImage};

#[test]
fn assembled_program_placed_via_script_round_trips_off_the_image() {
    let source = " ORG $0800\n LDA #$42\n STA $C010\n RTS\n";
    let result = Assembler::new().assemble(source, "program.s");
    assert_eq!(result.error_count, 0);

    let mut object = result.binary.bytes().to_vec();
    object.resize(256, 0);

    let mut image = DiskImage::new_rwts16();
    image.run_script("RWTS16,0,256,1,3\n", &object).unwrap();

    let track1 = match &image {
        DiskImage::Rwts16(n) => n.track(1),
        _ => unreachable!(),
    };
    let data_start = 528 + 3 + 8 + 3 + 5 + 3;
    let nibbles: [u8; 343] = track1[data_start..data_start + 343].try_into().unwrap();
    let decoded = decode_6_and_2(&nibbles).unwrap();
    assert_eq!(decoded.to_vec(), object);
}

#[test]
fn placement_script_with_multiple_records_reports_no_overlap_errors() {
    let object = vec![0xAAu8; 512];
    let mut image = DiskImage::new_rwts16();
    let script = "\
        # two consecutive sectors on track 0\n\
        RWTS16,0,256,0,0\n\
        RWTS16,256,256,0,1\n\
    ";
    image.run_script(script, &object).unwrap();
    assert_eq!(image.image().len(), 232_960);
}

#[test]
fn rw18_script_record_places_onto_the_correct_side() {
    let object = vec![0x55u8; 256];
    let mut image = DiskImage::new_rw18();
    image.run_script("RW18,0,256,1,2,0\n", &object).unwrap();
    assert!(matches!(image, DiskImage::Rw18(_)));
}

#[test]
fn bad_track_in_a_script_record_surfaces_as_a_disk_error() {
    let object = vec![0u8; 256];
    let mut image = DiskImage::new_rwts16();
    let err = image.run_script("RWTS16,0,256,99,0\n", &object).unwrap_err();
    assert!(err.to_string().contains("track"));
}
