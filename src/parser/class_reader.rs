// Binary class reader
//
// Decodes one class file into an ordered list of structural events. The
// reader has no notion of dependencies; it only reports what the class file
// names.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::bytes::ByteReader;
use super::constant_pool::{ConstantPool, Loadable};
use super::events::*;
use super::opcodes::{self, operand_length};
use super::DecodeError;

const MAGIC: u32 = 0xCAFE_BABE;

/// Bootstrap arguments may themselves be dynamic constants
const MAX_CONSTANT_DEPTH: usize = 16;

/// Nested annotation and array element values
const MAX_ELEMENT_DEPTH: usize = 64;

/// A fully decoded class: its internal name and its event sequence
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClass {
    name: String,
    events: Vec<ClassEvent>,
}

impl DecodedClass {
    /// Internal (slash separated) name of the class
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events(&self) -> &[ClassEvent] {
        &self.events
    }

    pub fn header(&self) -> Option<&ClassHeader> {
        self.events.iter().find_map(|event| match event {
            ClassEvent::Header(header) => Some(header),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a DecodedClass {
    type Item = &'a ClassEvent;
    type IntoIter = std::slice::Iter<'a, ClassEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Decode a class file.
///
/// Events are ordered: header, class annotations, then each field with its
/// annotations, then each method with its annotations, annotation default
/// and code (instructions, exception handlers, local variables).
pub fn decode(bytes: &[u8]) -> Result<DecodedClass, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let magic = reader.read_u4()?;
    if magic != MAGIC {
        return Err(DecodeError::BadMagic(magic));
    }
    let minor_version = reader.read_u2()?;
    let major_version = reader.read_u2()?;
    let pool = ConstantPool::read(&mut reader)?;

    let access = reader.read_u2()?;
    let name = pool.class_name(reader.read_u2()?)?.to_owned();
    let super_name = match reader.read_u2()? {
        0 => None,
        index => Some(pool.class_name(index)?.to_owned()),
    };
    let interface_count = reader.read_u2()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(reader.read_u2()?)?.to_owned());
    }

    // Class attributes come after the members but are needed first
    // (bootstrap methods, class signature), so skip ahead and come back.
    let members_start = reader.position();
    skip_members(&mut reader)?;
    skip_members(&mut reader)?;

    let mut decoder = Decoder {
        pool: &pool,
        bootstrap: Vec::new(),
        dynamic: RefCell::default(),
        events: Vec::new(),
    };

    let mut signature = None;
    let mut annotations = Vec::new();
    for attribute in read_attributes(&mut reader, &pool)? {
        match attribute.name {
            "Signature" => signature = Some(decoder.utf8_at(attribute.body)?),
            "BootstrapMethods" => decoder.bootstrap = read_bootstrap_methods(attribute.body)?,
            _ => annotations.push(attribute),
        }
    }

    decoder.events.push(ClassEvent::Header(ClassHeader {
        major_version,
        minor_version,
        access,
        name: name.clone(),
        super_name,
        interfaces,
        signature,
    }));
    for attribute in &annotations {
        decoder.annotation_attribute(attribute, AnnotationSite::Class)?;
    }

    let mut reader = ByteReader::at(bytes, members_start);
    let field_count = reader.read_u2()?;
    for _ in 0..field_count {
        decoder.field(&mut reader)?;
    }
    let method_count = reader.read_u2()?;
    for _ in 0..method_count {
        decoder.method(&mut reader)?;
    }

    Ok(DecodedClass {
        name,
        events: decoder.events,
    })
}

struct Attribute<'a> {
    name: &'a str,
    body: &'a [u8],
}

fn read_attributes<'a, 'd: 'a>(
    reader: &mut ByteReader<'d>,
    pool: &'a ConstantPool,
) -> Result<Vec<Attribute<'a>>, DecodeError> {
    let count = reader.read_u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = pool.utf8(reader.read_u2()?)?;
        let len = reader.read_u4()? as usize;
        let body = reader.take(len)?;
        attributes.push(Attribute { name, body });
    }
    Ok(attributes)
}

fn skip_members(reader: &mut ByteReader<'_>) -> Result<(), DecodeError> {
    let count = reader.read_u2()?;
    for _ in 0..count {
        // access, name, descriptor
        reader.skip(6)?;
        let attributes = reader.read_u2()?;
        for _ in 0..attributes {
            reader.skip(2)?;
            let len = reader.read_u4()? as usize;
            reader.skip(len)?;
        }
    }
    Ok(())
}

struct BootstrapMethod {
    handle: u16,
    arguments: Vec<u16>,
}

fn read_bootstrap_methods(body: &[u8]) -> Result<Vec<BootstrapMethod>, DecodeError> {
    let mut reader = ByteReader::new(body);
    let count = reader.read_u2()?;
    let mut methods = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let handle = reader.read_u2()?;
        let argument_count = reader.read_u2()?;
        let mut arguments = Vec::with_capacity(argument_count as usize);
        for _ in 0..argument_count {
            arguments.push(reader.read_u2()?);
        }
        methods.push(BootstrapMethod { handle, arguments });
    }
    Ok(methods)
}

struct Decoder<'p> {
    pool: &'p ConstantPool,
    bootstrap: Vec<BootstrapMethod>,
    /// Dynamic constants resolved so far, by pool index
    dynamic: RefCell<HashMap<u16, Arc<BootstrapCall>>>,
    events: Vec<ClassEvent>,
}

impl<'p> Decoder<'p> {
    /// Attribute bodies that are a single Utf8 index (`Signature`)
    fn utf8_at(&self, body: &[u8]) -> Result<String, DecodeError> {
        let index = ByteReader::new(body).read_u2()?;
        Ok(self.pool.utf8(index)?.to_owned())
    }

    fn constant(&self, index: u16, depth: usize) -> Result<Constant, DecodeError> {
        if depth > MAX_CONSTANT_DEPTH {
            return Err(DecodeError::TooDeep(MAX_CONSTANT_DEPTH));
        }
        match self.pool.loadable(index)? {
            Loadable::Resolved(constant) => Ok(constant),
            Loadable::Dynamic { bootstrap, name_and_type } => {
                if let Some(call) = self.dynamic.borrow().get(&index) {
                    return Ok(Constant::Dynamic(Arc::clone(call)));
                }
                let call = Arc::new(self.bootstrap_call(bootstrap, name_and_type, depth + 1)?);
                self.dynamic.borrow_mut().insert(index, Arc::clone(&call));
                Ok(Constant::Dynamic(call))
            }
        }
    }

    fn bootstrap_call(&self, bootstrap: u16, name_and_type: u16, depth: usize) -> Result<BootstrapCall, DecodeError> {
        let method = self
            .bootstrap
            .get(bootstrap as usize)
            .ok_or(DecodeError::BadBootstrapIndex(bootstrap))?;
        let (name, descriptor) = self.pool.name_and_type(name_and_type)?;
        let arguments = method
            .arguments
            .iter()
            .map(|&argument| self.constant(argument, depth))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BootstrapCall {
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            bootstrap: self.pool.method_handle(method.handle)?,
            arguments,
        })
    }

    fn field(&mut self, reader: &mut ByteReader<'_>) -> Result<(), DecodeError> {
        let access = reader.read_u2()?;
        let name = self.pool.utf8(reader.read_u2()?)?.to_owned();
        let descriptor = self.pool.utf8(reader.read_u2()?)?.to_owned();

        let mut signature = None;
        let mut constant = None;
        let mut annotations = Vec::new();
        for attribute in read_attributes(reader, self.pool)? {
            match attribute.name {
                "Signature" => signature = Some(self.utf8_at(attribute.body)?),
                "ConstantValue" => {
                    let index = ByteReader::new(attribute.body).read_u2()?;
                    constant = Some(self.constant(index, 0)?);
                }
                _ => annotations.push(attribute),
            }
        }

        self.events.push(ClassEvent::Field(FieldInfo {
            access,
            name,
            descriptor,
            signature,
            constant,
        }));
        for attribute in &annotations {
            self.annotation_attribute(attribute, AnnotationSite::Field)?;
        }
        Ok(())
    }

    fn method(&mut self, reader: &mut ByteReader<'_>) -> Result<(), DecodeError> {
        let access = reader.read_u2()?;
        let name = self.pool.utf8(reader.read_u2()?)?.to_owned();
        let descriptor = self.pool.utf8(reader.read_u2()?)?.to_owned();

        let mut signature = None;
        let mut exceptions = Vec::new();
        let mut annotations = Vec::new();
        let mut default_value = None;
        let mut code = None;
        for attribute in read_attributes(reader, self.pool)? {
            match attribute.name {
                "Signature" => signature = Some(self.utf8_at(attribute.body)?),
                "Exceptions" => {
                    let mut body = ByteReader::new(attribute.body);
                    let count = body.read_u2()?;
                    for _ in 0..count {
                        exceptions.push(self.pool.class_name(body.read_u2()?)?.to_owned());
                    }
                }
                "AnnotationDefault" => {
                    default_value = Some(self.element_value(&mut ByteReader::new(attribute.body), 0)?);
                }
                "Code" => code = Some(attribute.body),
                _ => annotations.push(attribute),
            }
        }

        self.events.push(ClassEvent::Method(MethodInfo {
            access,
            name,
            descriptor,
            signature,
            exceptions,
        }));
        for attribute in &annotations {
            self.annotation_attribute(attribute, AnnotationSite::Method)?;
        }
        if let Some(value) = default_value {
            self.events.push(ClassEvent::AnnotationDefault(value));
        }
        if let Some(body) = code {
            self.code(body)?;
        }
        Ok(())
    }

    /// Emit events for any of the annotation attribute kinds; other
    /// attributes are ignored.
    fn annotation_attribute(&mut self, attribute: &Attribute<'_>, site: AnnotationSite) -> Result<(), DecodeError> {
        let mut reader = ByteReader::new(attribute.body);
        match attribute.name {
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                let visible = attribute.name == "RuntimeVisibleAnnotations";
                let count = reader.read_u2()?;
                for _ in 0..count {
                    let annotation = self.annotation(&mut reader, visible, 0)?;
                    self.events.push(ClassEvent::Annotation { site, annotation });
                }
            }
            "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
                let visible = attribute.name == "RuntimeVisibleParameterAnnotations";
                let parameters = reader.read_u1()?;
                for parameter in 0..parameters {
                    let count = reader.read_u2()?;
                    for _ in 0..count {
                        let annotation = self.annotation(&mut reader, visible, 0)?;
                        self.events.push(ClassEvent::Annotation {
                            site: AnnotationSite::Parameter(parameter),
                            annotation,
                        });
                    }
                }
            }
            "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
                let visible = attribute.name == "RuntimeVisibleTypeAnnotations";
                let count = reader.read_u2()?;
                for _ in 0..count {
                    let target = reader.read_u1()?;
                    skip_target_info(&mut reader, target)?;
                    let path_length = reader.read_u1()? as usize;
                    reader.skip(path_length * 2)?;
                    let annotation = self.annotation(&mut reader, visible, 0)?;
                    self.events.push(ClassEvent::Annotation {
                        site: AnnotationSite::TypeUse { target },
                        annotation,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn annotation(&self, reader: &mut ByteReader<'_>, visible: bool, depth: usize) -> Result<Annotation, DecodeError> {
        let descriptor = self.pool.utf8(reader.read_u2()?)?.to_owned();
        let pairs = reader.read_u2()?;
        let mut elements = Vec::with_capacity(pairs as usize);
        for _ in 0..pairs {
            let name = self.pool.utf8(reader.read_u2()?)?.to_owned();
            let value = self.element_value(reader, depth + 1)?;
            elements.push((name, value));
        }
        Ok(Annotation {
            descriptor,
            visible,
            elements,
        })
    }

    fn element_value(&self, reader: &mut ByteReader<'_>, depth: usize) -> Result<ElementValue, DecodeError> {
        if depth > MAX_ELEMENT_DEPTH {
            return Err(DecodeError::TooDeep(MAX_ELEMENT_DEPTH));
        }
        let tag = reader.read_u1()? as char;
        let value = match tag {
            'B' | 'C' | 'I' | 'S' | 'Z' | 'D' | 'F' | 'J' => ElementValue::Const(self.pool.primitive(reader.read_u2()?)?),
            's' => ElementValue::Const(Constant::String(self.pool.utf8(reader.read_u2()?)?.to_owned())),
            'e' => {
                let descriptor = self.pool.utf8(reader.read_u2()?)?.to_owned();
                let constant = self.pool.utf8(reader.read_u2()?)?.to_owned();
                ElementValue::Enum { descriptor, constant }
            }
            'c' => ElementValue::Class(self.pool.utf8(reader.read_u2()?)?.to_owned()),
            '@' => ElementValue::Annotation(self.annotation(reader, true, depth + 1)?),
            '[' => {
                let count = reader.read_u2()?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(self.element_value(reader, depth + 1)?);
                }
                ElementValue::Array(values)
            }
            other => return Err(DecodeError::BadElementTag(other)),
        };
        Ok(value)
    }

    fn code(&mut self, body: &[u8]) -> Result<(), DecodeError> {
        let mut reader = ByteReader::new(body);
        // max_stack, max_locals
        reader.skip(4)?;
        let code_length = reader.read_u4()? as usize;
        let code = reader.take(code_length)?;
        self.instructions(code)?;

        let handlers = reader.read_u2()?;
        for _ in 0..handlers {
            // start_pc, end_pc, handler_pc
            reader.skip(6)?;
            let catch_type = match reader.read_u2()? {
                0 => None,
                index => Some(self.pool.class_name(index)?.to_owned()),
            };
            self.events.push(ClassEvent::TryCatch { catch_type });
        }

        // LocalVariableTable and LocalVariableTypeTable describe the same
        // variables; join them on (start_pc, slot).
        let mut locals: BTreeMap<(u16, u16), (String, Option<String>, Option<String>)> = BTreeMap::new();
        let mut type_annotations = Vec::new();
        for attribute in read_attributes(&mut reader, self.pool)? {
            let typed = match attribute.name {
                "LocalVariableTable" => false,
                "LocalVariableTypeTable" => true,
                _ => {
                    type_annotations.push(attribute);
                    continue;
                }
            };
            let mut table = ByteReader::new(attribute.body);
            let count = table.read_u2()?;
            for _ in 0..count {
                let start_pc = table.read_u2()?;
                table.skip(2)?;
                let name = self.pool.utf8(table.read_u2()?)?.to_owned();
                let descriptor = self.pool.utf8(table.read_u2()?)?.to_owned();
                let slot = table.read_u2()?;
                let entry = locals.entry((start_pc, slot)).or_insert_with(|| (name, None, None));
                if typed {
                    entry.2 = Some(descriptor);
                } else {
                    entry.1 = Some(descriptor);
                }
            }
        }
        for (_, (name, descriptor, signature)) in locals {
            self.events.push(ClassEvent::LocalVariable {
                name,
                descriptor,
                signature,
            });
        }

        for attribute in &type_annotations {
            self.annotation_attribute(attribute, AnnotationSite::Method)?;
        }
        Ok(())
    }

    fn instructions(&mut self, code: &[u8]) -> Result<(), DecodeError> {
        let mut reader = ByteReader::new(code);
        while reader.remaining() > 0 {
            let offset = reader.position();
            let opcode = reader.read_u1()?;
            let instruction = match opcode {
                opcodes::LDC => {
                    let index = reader.read_u1()? as u16;
                    Some(Instruction::LoadConstant(self.constant(index, 0)?))
                }
                opcodes::LDC_W | opcodes::LDC2_W => {
                    let index = reader.read_u2()?;
                    Some(Instruction::LoadConstant(self.constant(index, 0)?))
                }
                opcodes::GETSTATIC..=opcodes::PUTFIELD => {
                    let member = self.pool.member_ref(reader.read_u2()?)?;
                    Some(Instruction::Field {
                        opcode,
                        owner: member.owner.to_owned(),
                        name: member.name.to_owned(),
                        descriptor: member.descriptor.to_owned(),
                    })
                }
                opcodes::INVOKEVIRTUAL..=opcodes::INVOKEINTERFACE => {
                    let member = self.pool.member_ref(reader.read_u2()?)?;
                    if opcode == opcodes::INVOKEINTERFACE {
                        // count, zero
                        reader.skip(2)?;
                    }
                    Some(Instruction::Method {
                        opcode,
                        owner: member.owner.to_owned(),
                        name: member.name.to_owned(),
                        descriptor: member.descriptor.to_owned(),
                        interface: member.interface,
                    })
                }
                opcodes::INVOKEDYNAMIC => {
                    let (bootstrap, name_and_type) = self.pool.invoke_dynamic(reader.read_u2()?)?;
                    reader.skip(2)?;
                    Some(Instruction::InvokeDynamic(self.bootstrap_call(bootstrap, name_and_type, 0)?))
                }
                opcodes::NEW | opcodes::ANEWARRAY | opcodes::CHECKCAST | opcodes::INSTANCEOF => {
                    let name = self.pool.class_name(reader.read_u2()?)?.to_owned();
                    Some(Instruction::Type { opcode, name })
                }
                opcodes::MULTIANEWARRAY => {
                    let descriptor = self.pool.class_name(reader.read_u2()?)?.to_owned();
                    let dimensions = reader.read_u1()?;
                    Some(Instruction::MultiANewArray { descriptor, dimensions })
                }
                opcodes::TABLESWITCH => {
                    reader.skip(switch_padding(offset))?;
                    reader.skip(4)?;
                    let low = reader.read_i4()?;
                    let high = reader.read_i4()?;
                    if high < low {
                        return Err(DecodeError::BadSwitch(offset));
                    }
                    let targets = (high as i64 - low as i64 + 1) as usize;
                    reader.skip(targets * 4).map_err(|_| DecodeError::BadSwitch(offset))?;
                    None
                }
                opcodes::LOOKUPSWITCH => {
                    reader.skip(switch_padding(offset))?;
                    reader.skip(4)?;
                    let pairs = reader.read_i4()?;
                    if pairs < 0 {
                        return Err(DecodeError::BadSwitch(offset));
                    }
                    reader.skip(pairs as usize * 8).map_err(|_| DecodeError::BadSwitch(offset))?;
                    None
                }
                opcodes::WIDE => {
                    let modified = reader.read_u1()?;
                    reader.skip(if modified == opcodes::IINC { 4 } else { 2 })?;
                    None
                }
                _ => {
                    let len = operand_length(opcode).ok_or(DecodeError::UnknownOpcode { opcode, offset })?;
                    reader.skip(len)?;
                    None
                }
            };

            if let Some(instruction) = instruction {
                self.events.push(ClassEvent::Instruction { offset, instruction });
            }
        }
        Ok(())
    }
}

/// Switch operands start at the next multiple of four after the opcode
fn switch_padding(offset: usize) -> usize {
    (4 - (offset + 1) % 4) % 4
}

fn skip_target_info(reader: &mut ByteReader<'_>, target: u8) -> Result<(), DecodeError> {
    let len = match target {
        0x00 | 0x01 => 1,
        0x10 => 2,
        0x11 | 0x12 => 2,
        0x13..=0x15 => 0,
        0x16 => 1,
        0x17 => 2,
        0x40 | 0x41 => {
            let entries = reader.read_u2()? as usize;
            entries * 6
        }
        0x42 => 2,
        0x43..=0x46 => 2,
        0x47..=0x4b => 3,
        other => return Err(DecodeError::BadTypeAnnotationTarget(other)),
    };
    reader.skip(len)
}
