//! `diskimg <script> <out.nib> [object files...]` -- drives the disk-image
//! builder from a placement script, reporting each placement record as it
//! runs and a final summary table.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use merlin6502::binary_buffer::BinaryBuffer;
use merlin6502::disk::script;
use merlin6502::DiskImage;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("usage: diskimg <script> <out.nib> [object files...]");
        std::process::exit(1);
    }
    let script_path = &args[0];
    let out_path = &args[1];
    let object_paths = &args[2..];

    let script_text = std::fs::read_to_string(script_path).unwrap_or_else(|e| {
        eprintln!("{script_path}: {e}");
        std::process::exit(1);
    });

    let object = load_objects(object_paths);

    let records = script::parse(&script_text).unwrap_or_else(|e| {
        eprintln!("{script_path}: {e}");
        std::process::exit(1);
    });

    let mut image = DiskImage::new_rwts16();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Kind", "Source offset", "Length", "Track", "Sector/Side", "Offset"]);

    for record in &records {
        log::info!("placing record {record:?}");
        match record {
            script::ScriptRecord::Rwts16 { source_offset, length, track, sector } => {
                table.add_row([
                    "RWTS16".to_string(),
                    source_offset.to_string(),
                    length.to_string(),
                    track.to_string(),
                    sector.to_string(),
                    "-".to_string(),
                ]);
            }
            script::ScriptRecord::Rw18 { source_offset, length, side, track, offset } => {
                table.add_row([
                    "RW18".to_string(),
                    source_offset.to_string(),
                    length.to_string(),
                    track.to_string(),
                    side.to_string(),
                    offset.to_string(),
                ]);
            }
        }
    }

    if let Err(e) = image.run_script(&script_text, &object) {
        eprintln!("{script_path}: {e}");
        std::process::exit(1);
    }

    if let Err(e) = image.write_image(out_path) {
        eprintln!("{out_path}: {e}");
        std::process::exit(1);
    }

    println!("{table}");
    println!("{} record(s) placed, {} bytes written to {out_path}", records.len(), image.image().len());
}

/// Concatenates every object file's raw bytes, in argument order, stripping
/// the `.SAV` header where one is present so a script's `source-offset`
/// indexes into one contiguous address space regardless of how many object
/// files contributed to it.
fn load_objects(paths: &[String]) -> Vec<u8> {
    let mut object = Vec::new();
    for path in paths {
        let data = std::fs::read(path).unwrap_or_else(|e| {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        });
        match BinaryBuffer::read_object_file(&data) {
            Ok((_, bytes)) => object.extend(bytes),
            Err(_) => object.extend(data),
        }
    }
    object
}
