use super::bytes::ByteReader;
use super::events::{Constant, Handle};
use super::DecodeError;

#[derive(Debug, Clone)]
enum Entry {
    /// Slot 0 and the second slot of longs and doubles
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef { class: u16, name_and_type: u16 },
    MethodRef { class: u16, name_and_type: u16 },
    InterfaceMethodRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    Dynamic { bootstrap: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap: u16, name_and_type: u16 },
    /// Module and package names are never followed
    Module,
    Package,
}

impl Entry {
    fn kind_name(&self) -> &'static str {
        match self {
            Entry::Unusable => "unusable slot",
            Entry::Utf8(_) => "Utf8",
            Entry::Integer(_) => "Integer",
            Entry::Float(_) => "Float",
            Entry::Long(_) => "Long",
            Entry::Double(_) => "Double",
            Entry::Class(_) => "Class",
            Entry::String(_) => "String",
            Entry::FieldRef { .. } => "Fieldref",
            Entry::MethodRef { .. } => "Methodref",
            Entry::InterfaceMethodRef { .. } => "InterfaceMethodref",
            Entry::NameAndType { .. } => "NameAndType",
            Entry::MethodHandle { .. } => "MethodHandle",
            Entry::MethodType(_) => "MethodType",
            Entry::Dynamic { .. } => "Dynamic",
            Entry::InvokeDynamic { .. } => "InvokeDynamic",
            Entry::Module => "Module",
            Entry::Package => "Package",
        }
    }
}

/// Field or method reference resolved from the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef<'p> {
    pub owner: &'p str,
    pub name: &'p str,
    pub descriptor: &'p str,
    pub interface: bool,
}

/// A loadable pool entry. Dynamic constants need the bootstrap table to
/// resolve, so they are handed back unresolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable {
    Resolved(Constant),
    Dynamic { bootstrap: u16, name_and_type: u16 },
}

/// The constant pool of one class file
#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<Entry>,
}

impl ConstantPool {
    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(Entry::Unusable);

        while entries.len() < count {
            let index = entries.len() as u16;
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    let raw = reader.take(len)?;
                    let text = decode_modified_utf8(raw).ok_or(DecodeError::InvalidUtf8(index))?;
                    Entry::Utf8(text)
                }
                3 => Entry::Integer(reader.read_i4()?),
                4 => Entry::Float(f32::from_bits(reader.read_u4()?)),
                5 => Entry::Long(reader.read_u8()? as i64),
                6 => Entry::Double(f64::from_bits(reader.read_u8()?)),
                7 => Entry::Class(reader.read_u2()?),
                8 => Entry::String(reader.read_u2()?),
                9 | 10 | 11 => {
                    let class = reader.read_u2()?;
                    let name_and_type = reader.read_u2()?;
                    match tag {
                        9 => Entry::FieldRef { class, name_and_type },
                        10 => Entry::MethodRef { class, name_and_type },
                        _ => Entry::InterfaceMethodRef { class, name_and_type },
                    }
                }
                12 => Entry::NameAndType {
                    name: reader.read_u2()?,
                    descriptor: reader.read_u2()?,
                },
                15 => Entry::MethodHandle {
                    kind: reader.read_u1()?,
                    reference: reader.read_u2()?,
                },
                16 => Entry::MethodType(reader.read_u2()?),
                17 | 18 => {
                    let bootstrap = reader.read_u2()?;
                    let name_and_type = reader.read_u2()?;
                    if tag == 17 {
                        Entry::Dynamic { bootstrap, name_and_type }
                    } else {
                        Entry::InvokeDynamic { bootstrap, name_and_type }
                    }
                }
                19 | 20 => {
                    reader.skip(2)?;
                    if tag == 19 {
                        Entry::Module
                    } else {
                        Entry::Package
                    }
                }
                _ => return Err(DecodeError::UnknownConstantTag { index, tag }),
            };

            let wide = matches!(entry, Entry::Long(_) | Entry::Double(_));
            entries.push(entry);
            if wide {
                entries.push(Entry::Unusable);
            }
        }

        // A long or double in the last slot spills one past the declared count
        entries.truncate(count.max(1));

        Ok(Self { entries })
    }

    /// Number of slots, including the unusable slot 0
    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, index: u16) -> Result<&Entry, DecodeError> {
        match self.entries.get(index as usize) {
            None | Some(Entry::Unusable) => Err(DecodeError::BadConstantIndex(index)),
            Some(entry) => Ok(entry),
        }
    }

    fn unexpected(&self, index: u16, expected: &'static str) -> DecodeError {
        let found = self
            .entries
            .get(index as usize)
            .map(Entry::kind_name)
            .unwrap_or("missing entry");
        DecodeError::UnexpectedConstant { index, expected, found }
    }

    pub fn utf8(&self, index: u16) -> Result<&str, DecodeError> {
        match self.entry(index)? {
            Entry::Utf8(text) => Ok(text),
            _ => Err(self.unexpected(index, "Utf8")),
        }
    }

    /// Internal name held by a `Class` entry
    pub fn class_name(&self, index: u16) -> Result<&str, DecodeError> {
        match self.entry(index)? {
            Entry::Class(name) => self.utf8(*name),
            _ => Err(self.unexpected(index, "Class")),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), DecodeError> {
        match self.entry(index)? {
            Entry::NameAndType { name, descriptor } => Ok((self.utf8(*name)?, self.utf8(*descriptor)?)),
            _ => Err(self.unexpected(index, "NameAndType")),
        }
    }

    pub fn member_ref(&self, index: u16) -> Result<MemberRef<'_>, DecodeError> {
        let (class, name_and_type, interface) = match self.entry(index)? {
            Entry::FieldRef { class, name_and_type } | Entry::MethodRef { class, name_and_type } => {
                (*class, *name_and_type, false)
            }
            Entry::InterfaceMethodRef { class, name_and_type } => (*class, *name_and_type, true),
            _ => return Err(self.unexpected(index, "member reference")),
        };
        let owner = self.class_name(class)?;
        let (name, descriptor) = self.name_and_type(name_and_type)?;
        Ok(MemberRef { owner, name, descriptor, interface })
    }

    pub fn method_handle(&self, index: u16) -> Result<Handle, DecodeError> {
        match self.entry(index)? {
            Entry::MethodHandle { kind, reference } => {
                let member = self.member_ref(*reference)?;
                Ok(Handle {
                    kind: *kind,
                    owner: member.owner.to_owned(),
                    name: member.name.to_owned(),
                    descriptor: member.descriptor.to_owned(),
                    interface: member.interface,
                })
            }
            _ => Err(self.unexpected(index, "MethodHandle")),
        }
    }

    /// Bootstrap table index and name-and-type of an `InvokeDynamic` entry
    pub fn invoke_dynamic(&self, index: u16) -> Result<(u16, u16), DecodeError> {
        match self.entry(index)? {
            Entry::InvokeDynamic { bootstrap, name_and_type } => Ok((*bootstrap, *name_and_type)),
            _ => Err(self.unexpected(index, "InvokeDynamic")),
        }
    }

    pub fn loadable(&self, index: u16) -> Result<Loadable, DecodeError> {
        let constant = match self.entry(index)? {
            Entry::Integer(v) => Constant::Integer(*v),
            Entry::Float(v) => Constant::Float(*v),
            Entry::Long(v) => Constant::Long(*v),
            Entry::Double(v) => Constant::Double(*v),
            Entry::String(text) => Constant::String(self.utf8(*text)?.to_owned()),
            Entry::Class(name) => Constant::Class(self.utf8(*name)?.to_owned()),
            Entry::MethodType(descriptor) => Constant::MethodType(self.utf8(*descriptor)?.to_owned()),
            Entry::MethodHandle { .. } => Constant::MethodHandle(self.method_handle(index)?),
            Entry::Dynamic { bootstrap, name_and_type } => {
                return Ok(Loadable::Dynamic {
                    bootstrap: *bootstrap,
                    name_and_type: *name_and_type,
                })
            }
            _ => return Err(self.unexpected(index, "loadable constant")),
        };
        Ok(Loadable::Resolved(constant))
    }

    /// Numeric constant referenced by an annotation element or `ConstantValue`
    pub fn primitive(&self, index: u16) -> Result<Constant, DecodeError> {
        match self.entry(index)? {
            Entry::Integer(v) => Ok(Constant::Integer(*v)),
            Entry::Float(v) => Ok(Constant::Float(*v)),
            Entry::Long(v) => Ok(Constant::Long(*v)),
            Entry::Double(v) => Ok(Constant::Double(*v)),
            _ => Err(self.unexpected(index, "numeric constant")),
        }
    }
}

/// Decode the JVM's modified UTF-8: NUL is encoded as two bytes and
/// supplementary characters as surrogate pairs.
fn decode_modified_utf8(raw: &[u8]) -> Option<String> {
    if raw.iter().all(|&b| b != 0 && b < 0x80) {
        return String::from_utf8(raw.to_vec()).ok();
    }

    let mut units = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b & 0x80 == 0 {
            if b == 0 {
                return None;
            }
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = *raw.get(i + 1)?;
            if b2 & 0xC0 != 0x80 {
                return None;
            }
            units.push((((b & 0x1F) as u16) << 6) | (b2 & 0x3F) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = *raw.get(i + 1)?;
            let b3 = *raw.get(i + 2)?;
            if b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
                return None;
            }
            units.push((((b & 0x0F) as u16) << 12) | (((b2 & 0x3F) as u16) << 6) | (b3 & 0x3F) as u16);
            i += 3;
        } else {
            return None;
        }
    }

    String::from_utf16(&units).ok()
}
