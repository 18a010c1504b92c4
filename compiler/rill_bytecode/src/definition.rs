//! Instruction definitions: static per-opcode metadata.
//!
//! Table-driven on purpose: adding an operation means adding a table
//! entry, never touching the encoder.

use rustc_hash::FxHashMap;

use crate::error::EncodeError;
use crate::opcode::{Op, Width};

/// One opcode's metadata: a diagnostic name and the byte width of each
/// operand, in argument order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Definition {
    pub name: &'static str,
    pub operand_widths: &'static [Width],
}

impl Definition {
    /// Total encoded size: the opcode byte plus every operand.
    pub fn size(&self) -> usize {
        1 + self.operand_widths.iter().map(|w| w.bytes()).sum::<usize>()
    }
}

impl Op {
    /// The standard definition for this operation.
    const fn definition(self) -> Definition {
        const NONE: &[Width] = &[];
        const U8: &[Width] = &[Width::U8];
        const U16: &[Width] = &[Width::U16];

        match self {
            Op::Constant => Definition {
                name: "Constant",
                operand_widths: U16,
            },
            Op::Add => Definition {
                name: "Add",
                operand_widths: NONE,
            },
            Op::Sub => Definition {
                name: "Sub",
                operand_widths: NONE,
            },
            Op::Div => Definition {
                name: "Div",
                operand_widths: NONE,
            },
            Op::Mul => Definition {
                name: "Mul",
                operand_widths: NONE,
            },
            Op::SetVar => Definition {
                name: "SetVar",
                operand_widths: U16,
            },
            Op::GetVar => Definition {
                name: "GetVar",
                operand_widths: U16,
            },
            Op::DeclVar => Definition {
                name: "DeclVar",
                operand_widths: U16,
            },
            Op::Return => Definition {
                name: "Return",
                operand_widths: NONE,
            },
            Op::ReturnVal => Definition {
                name: "ReturnVal",
                operand_widths: U8,
            },
            Op::Jump => Definition {
                name: "Jump",
                operand_widths: U16,
            },
            Op::JumpZ => Definition {
                name: "JumpZ",
                operand_widths: U16,
            },
            Op::Pop => Definition {
                name: "Pop",
                operand_widths: NONE,
            },
            Op::CallFunc => Definition {
                name: "CallFunc",
                // Function address, then argument count.
                operand_widths: &[Width::U32, Width::U8],
            },
            Op::GetAttr => Definition {
                name: "GetAttr",
                operand_widths: U16,
            },
            Op::SetAttr => Definition {
                name: "SetAttr",
                operand_widths: U16,
            },
            Op::UnaryNot => Definition {
                name: "UnaryNot",
                operand_widths: NONE,
            },
            Op::UnaryNeg => Definition {
                name: "UnaryNeg",
                operand_widths: NONE,
            },
            Op::And => Definition {
                name: "And",
                operand_widths: NONE,
            },
            Op::Or => Definition {
                name: "Or",
                operand_widths: NONE,
            },
            Op::Mod => Definition {
                name: "Mod",
                operand_widths: NONE,
            },
            Op::Equal => Definition {
                name: "Equal",
                operand_widths: NONE,
            },
            Op::NotEqual => Definition {
                name: "NotEqual",
                operand_widths: NONE,
            },
            Op::Less => Definition {
                name: "Less",
                operand_widths: NONE,
            },
            Op::LessOrEqual => Definition {
                name: "LessOrEqual",
                operand_widths: NONE,
            },
        }
    }
}

/// Opcode → definition mapping, constructed once before encoding starts.
///
/// An explicit object rather than process-wide state; embedders with an
/// extended operation set [`register`] their additions after
/// [`standard`].
///
/// [`register`]: DefinitionTable::register
/// [`standard`]: DefinitionTable::standard
pub struct DefinitionTable {
    defs: FxHashMap<u8, Definition>,
}

impl DefinitionTable {
    /// An empty table.
    pub fn empty() -> Self {
        DefinitionTable {
            defs: FxHashMap::default(),
        }
    }

    /// The standard operation set.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for op in Op::ALL {
            table.register(op.code(), op.definition());
        }
        table
    }

    /// Add or replace a definition.
    pub fn register(&mut self, code: u8, definition: Definition) {
        self.defs.insert(code, definition);
    }

    /// The definition for `code`.
    ///
    /// An unknown opcode is an explicit error, never a placeholder
    /// definition the caller could mistake for a real one.
    pub fn lookup(&self, code: u8) -> Result<&Definition, EncodeError> {
        self.defs
            .get(&code)
            .ok_or(EncodeError::UnknownOpcode { code })
    }
}

impl Default for DefinitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_covers_every_op() {
        let table = DefinitionTable::standard();
        for op in Op::ALL {
            let def = table.lookup(op.code()).unwrap();
            assert!(!def.name.is_empty());
        }
    }

    #[test]
    fn test_lookup_unknown_is_error() {
        let table = DefinitionTable::standard();
        assert_eq!(
            table.lookup(0xEE),
            Err(EncodeError::UnknownOpcode { code: 0xEE })
        );
    }

    #[test]
    fn test_definition_size() {
        let table = DefinitionTable::standard();
        assert_eq!(table.lookup(Op::Constant.code()).unwrap().size(), 3);
        assert_eq!(table.lookup(Op::Add.code()).unwrap().size(), 1);
        assert_eq!(table.lookup(Op::CallFunc.code()).unwrap().size(), 6);
    }
}
