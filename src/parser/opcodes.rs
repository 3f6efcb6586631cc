//! Bytecode opcodes the reader needs to recognise by name.

pub const BIPUSH: u8 = 0x10;
pub const SIPUSH: u8 = 0x11;
pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;
pub const IINC: u8 = 0x84;
pub const RET: u8 = 0xa9;
pub const TABLESWITCH: u8 = 0xaa;
pub const LOOKUPSWITCH: u8 = 0xab;
pub const GETSTATIC: u8 = 0xb2;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const NEWARRAY: u8 = 0xbc;
pub const ANEWARRAY: u8 = 0xbd;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;
pub const WIDE: u8 = 0xc4;
pub const MULTIANEWARRAY: u8 = 0xc5;
pub const IFNULL: u8 = 0xc6;
pub const IFNONNULL: u8 = 0xc7;
pub const GOTO_W: u8 = 0xc8;
pub const JSR_W: u8 = 0xc9;

/// Operand length of instructions that carry no constant-pool reference and
/// have a fixed size. `None` for unknown opcodes.
pub fn operand_length(opcode: u8) -> Option<usize> {
    let len = match opcode {
        0x00..=0x0f => 0,
        BIPUSH => 1,
        SIPUSH => 2,
        0x15..=0x19 => 1,
        0x1a..=0x35 => 0,
        0x36..=0x3a => 1,
        0x3b..=0x83 => 0,
        IINC => 2,
        0x85..=0x98 => 0,
        0x99..=0xa8 => 2,
        RET => 1,
        0xac..=0xb1 => 0,
        NEWARRAY => 1,
        0xbe | 0xbf | 0xc2 | 0xc3 => 0,
        IFNULL | IFNONNULL => 2,
        GOTO_W | JSR_W => 4,
        0xca | 0xfe | 0xff => 0,
        _ => return None,
    };
    Some(len)
}
