use thiserror::Error;

/// Failure to decode one compiled unit.
///
/// A decode error only ever aborts the unit being read; nothing is recorded
/// for that unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not a class file (magic 0x{0:08x})")]
    BadMagic(u32),

    #[error("unexpected end of data at offset {offset} ({needed} more bytes needed)")]
    Truncated { offset: usize, needed: usize },

    #[error("constant pool index {0} is out of range or unusable")]
    BadConstantIndex(u16),

    #[error("constant pool entry {index} is a {found}, expected {expected}")]
    UnexpectedConstant {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown constant pool tag {tag} at entry {index}")]
    UnknownConstantTag { index: u16, tag: u8 },

    #[error("invalid modified UTF-8 in constant pool entry {0}")]
    InvalidUtf8(u16),

    #[error("bootstrap method index {0} is out of range")]
    BadBootstrapIndex(u16),

    #[error("unknown opcode 0x{opcode:02x} at bytecode offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("malformed switch at bytecode offset {0}")]
    BadSwitch(usize),

    #[error("unknown annotation element tag `{0}`")]
    BadElementTag(char),

    #[error("unknown type annotation target 0x{0:02x}")]
    BadTypeAnnotationTarget(u8),

    #[error("malformed descriptor `{0}`")]
    BadDescriptor(String),

    #[error("malformed signature `{0}`")]
    BadSignature(String),

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
}
