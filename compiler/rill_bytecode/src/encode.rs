//! The instruction encoder.
//!
//! Layout, bit-exact: `[opcode: 1 byte][operand_0: width_0 bytes, LE]
//! [operand_1: width_1 bytes, LE]...`, each operand written at the
//! running byte offset, little-endian, at its declared width.
//!
//! [`make`] is a pure function over the (immutable) definition table and
//! allocates a fresh buffer per call, so it is safe to call from any
//! number of threads at once.

use std::fmt::Write as _;

use crate::definition::{Definition, DefinitionTable};
use crate::error::EncodeError;
use crate::opcode::Op;

/// Encode one instruction.
///
/// The operand list length must equal the definition's width list
/// length, and every value must fit its declared width; violations are
/// surfaced, never truncated or dropped.
pub fn make(table: &DefinitionTable, code: u8, operands: &[u32]) -> Result<Vec<u8>, EncodeError> {
    let def = table.lookup(code)?;
    if operands.len() != def.operand_widths.len() {
        return Err(EncodeError::OperandCount {
            name: def.name,
            expected: def.operand_widths.len(),
            found: operands.len(),
        });
    }

    let mut out = Vec::with_capacity(def.size());
    out.push(code);
    for (index, (&value, &width)) in operands.iter().zip(def.operand_widths).enumerate() {
        if !width.fits(value) {
            return Err(EncodeError::OperandRange {
                name: def.name,
                index,
                value,
                width,
            });
        }
        out.extend_from_slice(&value.to_le_bytes()[..width.bytes()]);
    }
    Ok(out)
}

/// Decode the operand list of one encoded instruction (the bytes after
/// the opcode). Returns the values and the byte count consumed, or
/// `None` if the input is truncated.
pub fn read_operands(def: &Definition, bytes: &[u8]) -> Option<(Vec<u32>, usize)> {
    let mut values = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;
    for &width in def.operand_widths {
        let chunk = bytes.get(offset..offset + width.bytes())?;
        let mut le = [0u8; 4];
        le[..chunk.len()].copy_from_slice(chunk);
        values.push(u32::from_le_bytes(le));
        offset += width.bytes();
    }
    Some((values, offset))
}

/// Append-only instruction buffer for the code generator.
///
/// `emit` records each instruction's byte position so jump targets can
/// be back-patched once they are known.
#[derive(Clone, Debug, Default)]
pub struct Bytecode {
    bytes: Vec<u8>,
}

impl Bytecode {
    /// An empty buffer.
    pub fn new() -> Self {
        Bytecode::default()
    }

    /// Encode and append one instruction; returns its byte position.
    pub fn emit(
        &mut self,
        table: &DefinitionTable,
        op: Op,
        operands: &[u32],
    ) -> Result<usize, EncodeError> {
        let pos = self.bytes.len();
        let instruction = make(table, op.code(), operands)?;
        self.bytes.extend_from_slice(&instruction);
        tracing::trace!(?op, pos, "emit");
        Ok(pos)
    }

    /// Rewrite operand `index` of the instruction at `pos` (a value
    /// previously returned by [`emit`]): the back-patching path for
    /// forward jump targets.
    ///
    /// [`emit`]: Bytecode::emit
    pub fn patch_operand(
        &mut self,
        table: &DefinitionTable,
        pos: usize,
        index: usize,
        value: u32,
    ) -> Result<(), EncodeError> {
        let &code = self.bytes.get(pos).ok_or(EncodeError::PatchBounds { pos })?;
        let def = table.lookup(code)?;
        let (name, widths) = (def.name, def.operand_widths);
        if index >= widths.len() {
            return Err(EncodeError::OperandCount {
                name,
                expected: widths.len(),
                found: index + 1,
            });
        }
        let width = widths[index];
        if !width.fits(value) {
            return Err(EncodeError::OperandRange {
                name,
                index,
                value,
                width,
            });
        }

        let offset = pos + 1 + widths[..index].iter().map(|w| w.bytes()).sum::<usize>();
        let Some(slot) = self.bytes.get_mut(offset..offset + width.bytes()) else {
            return Err(EncodeError::PatchBounds { pos });
        };
        slot.copy_from_slice(&value.to_le_bytes()[..width.bytes()]);
        Ok(())
    }

    /// The encoded stream.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoded length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Render the stream as `offset name operands...` lines.
    pub fn disassemble(&self, table: &DefinitionTable) -> String {
        let mut out = String::new();
        let mut offset = 0;
        while offset < self.bytes.len() {
            let code = self.bytes[offset];
            let Ok(def) = table.lookup(code) else {
                let _ = writeln!(out, "{offset:04} unknown opcode 0x{code:02x}");
                offset += 1;
                continue;
            };
            let Some((values, consumed)) = read_operands(def, &self.bytes[offset + 1..]) else {
                let _ = writeln!(out, "{offset:04} {} <truncated>", def.name);
                break;
            };
            let _ = write!(out, "{offset:04} {}", def.name);
            for value in values {
                let _ = write!(out, " {value}");
            }
            out.push('\n');
            offset += 1 + consumed;
        }
        out
    }
}
