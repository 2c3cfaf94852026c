//! merlin6502 is a cross-assembler for the MOS 6502, 65C02, and 65816
//! microprocessors that accepts Merlin-style source text and produces
//! either a raw `.SAV` object file or a bit-accurate Apple II 5.25"
//! nibble disk image.
//!
//! The crate has two hard cores, grounded on the original `snapNcrackle`
//! assembler and disk imager (see DESIGN.md for the full grounding
//! ledger):
//!
//! - [`assembler`] — the two-pass-equivalent driver: directive dispatch,
//!   opcode tables across the three instruction sets, addressing-mode
//!   selection, and deferred forward-reference fixup.
//! - [`disk`] — the nibble disk-image encoder: RWTS16 and RW18 sector
//!   layout, 6-and-2/4-and-4 group encoding, and the placement-script
//!   engine that reads an object file onto simulated disk media.
//!
//! # Examples
//!
//! ```
//! use merlin6502::Assembler;
//!
//! let result = Assembler::new().assemble(" ORG $0800\n DEX\n", "demo.s");
//! assert_eq!(result.error_count, 0);
//! assert_eq!(result.binary.bytes(), &[0xCA]);
//! ```

pub mod assembler;
pub mod binary_buffer;
pub mod disk;
pub mod error;
pub mod expr;
pub mod line_info;
pub mod listing;
pub mod parse_line;
pub mod sized_string;
pub mod symbol;

pub use assembler::{AssembleResult, Assembler};
pub use disk::{DiskImage, Insert as DiskInsert};
pub use error::{Diagnostic, DiskError, ExprError, LineError, OperandError, SavError};
