//! Shared helpers for integration tests
//!
//! `ClassFileBuilder` assembles class files byte by byte so tests can
//! describe exactly which references a class carries.

#![allow(dead_code, unused_imports)]

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub const ACC_PUBLIC: u16 = 0x0001;

pub use classvacuum::parser::opcodes::{
    ANEWARRAY, CHECKCAST, GETSTATIC, INSTANCEOF, INVOKEDYNAMIC, INVOKEINTERFACE, INVOKEVIRTUAL, LDC_W,
    MULTIANEWARRAY, NEW,
};

pub const POP: u8 = 0x57;
pub const ALOAD_0: u8 = 0x2a;
pub const RETURN: u8 = 0xb1;

/// Method handle kind `REF_invokeStatic`
pub const REF_INVOKE_STATIC: u8 = 6;

/// Annotation element value
pub enum Element<'a> {
    Int(i32),
    Str(&'a str),
    Enum(&'a str, &'a str),
    Class(&'a str),
    Annotation(&'a str),
    Array(Vec<Element<'a>>),
}

pub struct ClassFileBuilder {
    pool: Vec<u8>,
    next_slot: u16,
    dedupe: HashMap<Vec<u8>, u16>,
    access: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<u8>,
    field_count: u16,
    methods: Vec<u8>,
    method_count: u16,
    attributes: Vec<Vec<u8>>,
    bootstrap: Vec<(u16, Vec<u16>)>,
}

impl ClassFileBuilder {
    /// Class `name` (internal form) extending `super_name`
    pub fn new(name: &str, super_name: Option<&str>) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            next_slot: 1,
            dedupe: HashMap::new(),
            access: ACC_PUBLIC,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            field_count: 0,
            methods: Vec::new(),
            method_count: 0,
            attributes: Vec::new(),
            bootstrap: Vec::new(),
        };
        builder.this_class = builder.class(name);
        if let Some(super_name) = super_name {
            builder.super_class = builder.class(super_name);
        }
        builder
    }

    /// A class extending `java/lang/Object`
    pub fn object(name: &str) -> Self {
        Self::new(name, Some("java/lang/Object"))
    }

    fn entry(&mut self, bytes: Vec<u8>, wide: bool) -> u16 {
        if let Some(&index) = self.dedupe.get(&bytes) {
            return index;
        }
        let index = self.next_slot;
        self.next_slot += if wide { 2 } else { 1 };
        self.pool.extend_from_slice(&bytes);
        self.dedupe.insert(bytes, index);
        index
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        let mut bytes = vec![1];
        bytes.extend_from_slice(&(text.len() as u16).to_be_bytes());
        bytes.extend_from_slice(text.as_bytes());
        self.entry(bytes, false)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.entry(tagged(7, &[name]), false)
    }

    pub fn string(&mut self, text: &str) -> u16 {
        let text = self.utf8(text);
        self.entry(tagged(8, &[text]), false)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut bytes = vec![3];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.entry(bytes, false)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut bytes = vec![5];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.entry(bytes, true)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.entry(tagged(12, &[name, descriptor]), false)
    }

    fn member(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let owner = self.class(owner);
        let name_and_type = self.name_and_type(name, descriptor);
        self.entry(tagged(tag, &[owner, name_and_type]), false)
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member(9, owner, name, descriptor)
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member(10, owner, name, descriptor)
    }

    pub fn interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member(11, owner, name, descriptor)
    }

    pub fn method_handle(&mut self, kind: u8, reference: u16) -> u16 {
        let mut bytes = vec![15, kind];
        bytes.extend_from_slice(&reference.to_be_bytes());
        self.entry(bytes, false)
    }

    pub fn method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor = self.utf8(descriptor);
        self.entry(tagged(16, &[descriptor]), false)
    }

    /// Entry of the `BootstrapMethods` table
    pub fn bootstrap_method(&mut self, handle: u16, arguments: &[u16]) -> u16 {
        self.bootstrap.push((handle, arguments.to_vec()));
        (self.bootstrap.len() - 1) as u16
    }

    pub fn invoke_dynamic(&mut self, bootstrap: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type = self.name_and_type(name, descriptor);
        self.entry(tagged(18, &[bootstrap, name_and_type]), false)
    }

    pub fn dynamic(&mut self, bootstrap: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type = self.name_and_type(name, descriptor);
        self.entry(tagged(17, &[bootstrap, name_and_type]), false)
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        let index = self.class(name);
        self.interfaces.push(index);
        self
    }

    /// Encode an attribute (name, length, body)
    pub fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let name = self.utf8(name);
        let mut bytes = name.to_be_bytes().to_vec();
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    pub fn signature_attribute(&mut self, signature: &str) -> Vec<u8> {
        let index = self.utf8(signature);
        self.attribute("Signature", &index.to_be_bytes())
    }

    pub fn constant_value_attribute(&mut self, index: u16) -> Vec<u8> {
        self.attribute("ConstantValue", &index.to_be_bytes())
    }

    pub fn exceptions_attribute(&mut self, exceptions: &[&str]) -> Vec<u8> {
        let mut body = (exceptions.len() as u16).to_be_bytes().to_vec();
        for exception in exceptions {
            let index = self.class(exception);
            body.extend_from_slice(&index.to_be_bytes());
        }
        self.attribute("Exceptions", &body)
    }

    /// Encode one annotation structure
    pub fn annotation(&mut self, descriptor: &str, elements: &[(&str, Element<'_>)]) -> Vec<u8> {
        let mut bytes = self.utf8(descriptor).to_be_bytes().to_vec();
        bytes.extend_from_slice(&(elements.len() as u16).to_be_bytes());
        for (name, value) in elements {
            let name = self.utf8(name);
            bytes.extend_from_slice(&name.to_be_bytes());
            let value = self.element(value);
            bytes.extend_from_slice(&value);
        }
        bytes
    }

    fn element(&mut self, element: &Element<'_>) -> Vec<u8> {
        match element {
            Element::Int(value) => {
                let index = self.integer(*value);
                tagged(b'I', &[index])
            }
            Element::Str(text) => {
                let index = self.utf8(text);
                tagged(b's', &[index])
            }
            Element::Enum(descriptor, constant) => {
                let descriptor = self.utf8(descriptor);
                let constant = self.utf8(constant);
                tagged(b'e', &[descriptor, constant])
            }
            Element::Class(descriptor) => {
                let index = self.utf8(descriptor);
                tagged(b'c', &[index])
            }
            Element::Annotation(descriptor) => {
                let mut bytes = vec![b'@'];
                bytes.extend(self.annotation(descriptor, &[]));
                bytes
            }
            Element::Array(values) => {
                let mut bytes = vec![b'['];
                bytes.extend_from_slice(&(values.len() as u16).to_be_bytes());
                for value in values {
                    let encoded = self.element(value);
                    bytes.extend(encoded);
                }
                bytes
            }
        }
    }

    pub fn annotations_attribute(&mut self, visible: bool, annotations: &[Vec<u8>]) -> Vec<u8> {
        let mut body = (annotations.len() as u16).to_be_bytes().to_vec();
        for annotation in annotations {
            body.extend_from_slice(annotation);
        }
        let name = if visible {
            "RuntimeVisibleAnnotations"
        } else {
            "RuntimeInvisibleAnnotations"
        };
        self.attribute(name, &body)
    }

    /// One list of annotations per parameter
    pub fn parameter_annotations_attribute(&mut self, parameters: &[Vec<Vec<u8>>]) -> Vec<u8> {
        let mut body = vec![parameters.len() as u8];
        for annotations in parameters {
            body.extend_from_slice(&(annotations.len() as u16).to_be_bytes());
            for annotation in annotations {
                body.extend_from_slice(annotation);
            }
        }
        self.attribute("RuntimeVisibleParameterAnnotations", &body)
    }

    /// Type annotation on a field type (target 0x13, empty path)
    pub fn field_type_annotations_attribute(&mut self, descriptor: &str) -> Vec<u8> {
        let mut body = 1u16.to_be_bytes().to_vec();
        body.push(0x13);
        body.push(0);
        let annotation = self.annotation(descriptor, &[]);
        body.extend(annotation);
        self.attribute("RuntimeVisibleTypeAnnotations", &body)
    }

    pub fn annotation_default_attribute(&mut self, value: &Element<'_>) -> Vec<u8> {
        let body = self.element(value);
        self.attribute("AnnotationDefault", &body)
    }

    /// `Code` attribute with one handler per catch type and local variable
    /// tables when locals are given
    pub fn code_attribute(
        &mut self,
        code: &[u8],
        catch_types: &[Option<&str>],
        locals: &[(u16, &str, &str)],
        local_types: &[(u16, &str, &str)],
    ) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&8u16.to_be_bytes());
        body.extend_from_slice(&8u16.to_be_bytes());
        body.extend_from_slice(&(code.len() as u32).to_be_bytes());
        body.extend_from_slice(code);

        body.extend_from_slice(&(catch_types.len() as u16).to_be_bytes());
        for catch_type in catch_types {
            let index = catch_type.map(|name| self.class(name)).unwrap_or(0);
            body.extend_from_slice(&0u16.to_be_bytes());
            body.extend_from_slice(&(code.len() as u16).to_be_bytes());
            body.extend_from_slice(&0u16.to_be_bytes());
            body.extend_from_slice(&index.to_be_bytes());
        }

        let mut attributes = Vec::new();
        for (table, name) in [(locals, "LocalVariableTable"), (local_types, "LocalVariableTypeTable")] {
            if table.is_empty() {
                continue;
            }
            let mut entries = (table.len() as u16).to_be_bytes().to_vec();
            for (slot, var_name, descriptor) in table {
                let var_name = self.utf8(var_name);
                let descriptor = self.utf8(descriptor);
                entries.extend_from_slice(&0u16.to_be_bytes());
                entries.extend_from_slice(&(code.len() as u16).to_be_bytes());
                entries.extend_from_slice(&var_name.to_be_bytes());
                entries.extend_from_slice(&descriptor.to_be_bytes());
                entries.extend_from_slice(&slot.to_be_bytes());
            }
            attributes.push(self.attribute(name, &entries));
        }

        body.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for attribute in attributes {
            body.extend(attribute);
        }
        self.attribute("Code", &body)
    }

    pub fn class_attribute(&mut self, attribute: Vec<u8>) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    pub fn class_signature(&mut self, signature: &str) -> &mut Self {
        let attribute = self.signature_attribute(signature);
        self.class_attribute(attribute)
    }

    pub fn field(&mut self, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> &mut Self {
        let bytes = self.member_bytes(name, descriptor, attributes);
        self.fields.extend(bytes);
        self.field_count += 1;
        self
    }

    pub fn method(&mut self, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> &mut Self {
        let bytes = self.member_bytes(name, descriptor, attributes);
        self.methods.extend(bytes);
        self.method_count += 1;
        self
    }

    fn member_bytes(&mut self, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> Vec<u8> {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut bytes = ACC_PUBLIC.to_be_bytes().to_vec();
        bytes.extend_from_slice(&name.to_be_bytes());
        bytes.extend_from_slice(&descriptor.to_be_bytes());
        bytes.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for attribute in attributes {
            bytes.extend(attribute);
        }
        bytes
    }

    pub fn build(mut self) -> Vec<u8> {
        if !self.bootstrap.is_empty() {
            let mut body = (self.bootstrap.len() as u16).to_be_bytes().to_vec();
            for (handle, arguments) in std::mem::take(&mut self.bootstrap) {
                body.extend_from_slice(&handle.to_be_bytes());
                body.extend_from_slice(&(arguments.len() as u16).to_be_bytes());
                for argument in arguments {
                    body.extend_from_slice(&argument.to_be_bytes());
                }
            }
            let attribute = self.attribute("BootstrapMethods", &body);
            self.attributes.push(attribute);
        }

        let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
        out.extend_from_slice(&self.next_slot.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&self.access.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }
        out.extend_from_slice(&self.field_count.to_be_bytes());
        out.extend_from_slice(&self.fields);
        out.extend_from_slice(&self.method_count.to_be_bytes());
        out.extend_from_slice(&self.methods);
        out.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            out.extend_from_slice(attribute);
        }
        out
    }
}

fn tagged(tag: u8, indices: &[u16]) -> Vec<u8> {
    let mut bytes = vec![tag];
    for index in indices {
        bytes.extend_from_slice(&index.to_be_bytes());
    }
    bytes
}

/// Bytecode assembler for the handful of instructions tests need
#[derive(Default)]
pub struct CodeBuilder {
    code: Vec<u8>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(mut self, opcode: u8) -> Self {
        self.code.push(opcode);
        self
    }

    pub fn op_u2(mut self, opcode: u8, index: u16) -> Self {
        self.code.push(opcode);
        self.code.extend_from_slice(&index.to_be_bytes());
        self
    }

    pub fn invokeinterface(mut self, index: u16, count: u8) -> Self {
        self = self.op_u2(INVOKEINTERFACE, index);
        self.code.extend_from_slice(&[count, 0]);
        self
    }

    pub fn invokedynamic(mut self, index: u16) -> Self {
        self = self.op_u2(INVOKEDYNAMIC, index);
        self.code.extend_from_slice(&[0, 0]);
        self
    }

    pub fn multianewarray(mut self, index: u16, dimensions: u8) -> Self {
        self = self.op_u2(MULTIANEWARRAY, index);
        self.code.push(dimensions);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.code
    }
}

/// A class `name` whose only references are fields of the given types
pub fn class_with_refs(name: &str, dependencies: &[&str]) -> Vec<u8> {
    let mut builder = ClassFileBuilder::object(name);
    for (i, dependency) in dependencies.iter().enumerate() {
        builder.field(&format!("f{}", i), &format!("L{};", dependency), Vec::new());
    }
    builder.build()
}

/// Entry name of a class inside an archive
pub fn entry_name(internal_name: &str) -> String {
    format!("{}.class", internal_name)
}

/// Write a jar holding `entries`
pub fn write_jar(path: &Path, entries: &[(String, Vec<u8>)]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    writer.start_file("META-INF/MANIFEST.MF", options).unwrap();
    writer.write_all(b"Manifest-Version: 1.0\n").unwrap();
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
}

/// Write class files into a package-structured directory
pub fn write_class_dir(root: &Path, entries: &[(String, Vec<u8>)]) {
    for (name, bytes) in entries {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }
}

/// Jar entries for classes given as `(internal name, field dependencies)`
pub fn classes(specs: &[(&str, &[&str])]) -> Vec<(String, Vec<u8>)> {
    specs
        .iter()
        .map(|(name, dependencies)| (entry_name(name), class_with_refs(name, dependencies)))
        .collect()
}
