//! `asm <source.s>` -- assembles a Merlin source file, writes the
//! companion `.SAV` object file next to it, and prints the listing to
//! standard output.

use merlin6502::Assembler;

fn main() {
    env_logger::init();

    let source_path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: asm <source.s>");
        std::process::exit(1);
    });

    let source = std::fs::read_to_string(&source_path).unwrap_or_else(|e| {
        eprintln!("{source_path}: {e}");
        std::process::exit(1);
    });

    let result = Assembler::new().assemble(&source, &source_path);

    for line in &result.lines {
        for row in merlin6502::listing::format_line(line) {
            println!("{row}");
        }
    }

    for diagnostic in &result.diagnostics {
        eprintln!("{source_path}:{diagnostic}");
    }

    let sav_path = sav_path_for(&source_path);
    if let Err(e) = std::fs::write(&sav_path, result.binary.write_object_file()) {
        eprintln!("{}: {e}", sav_path.display());
        std::process::exit(1);
    }

    println!("{} error(s)", result.error_count);
}

fn sav_path_for(source_path: &str) -> std::path::PathBuf {
    let mut path = std::path::PathBuf::from(source_path);
    path.set_extension("SAV");
    path
}
