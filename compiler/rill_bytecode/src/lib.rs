//! Instruction definitions and the binary instruction encoder for the
//! Rill compiler back end.
//!
//! The code generator emits (operation, operands) pairs; this crate
//! serializes them into the byte stream the VM consumes:
//!
//! ```text
//! [opcode: 1 byte][operand_0: width_0 bytes, LE][operand_1: ...]
//! ```
//!
//! - [`Op`] / [`Width`]: the standard operation set and the supported
//!   operand widths (8-, 16-, and 32-bit unsigned, little-endian).
//! - [`DefinitionTable`]: opcode → [`Definition`] metadata, built once;
//!   new operations are table entries, the encoder never changes.
//! - [`make`]: the pure encoding function. [`Bytecode`]: an append-only
//!   stream with position tracking and jump back-patching.
//!
//! Every failure ([`EncodeError`]) surfaces to the caller: an unknown
//! opcode or a malformed operand list never encodes to a placeholder or
//! an empty sequence.
//!
//! # Thread Safety
//!
//! Encoding is pure over an immutable table and allocates a fresh buffer
//! per call, so it is safe to use from any number of threads.

mod definition;
mod encode;
mod error;
mod opcode;

pub use definition::{Definition, DefinitionTable};
pub use encode::{make, read_operands, Bytecode};
pub use error::EncodeError;
pub use opcode::{Op, Width};
