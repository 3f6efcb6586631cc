// Structural events produced by the class reader.
//
// A decoded class is a flat, ordered sequence of these events: the header
// first, then class annotations, then each field followed by its own
// annotations, then each method followed by its annotations, annotation
// default and code.

use std::sync::Arc;

/// A loadable constant, as used by `ldc`, field initialisers and bootstrap
/// arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    /// Internal name, or an array descriptor when it starts with `[`
    Class(String),
    /// Method descriptor
    MethodType(String),
    MethodHandle(Handle),
    /// Shared between every bootstrap argument that names the same pool entry
    Dynamic(Arc<BootstrapCall>),
}

/// A method handle constant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    pub kind: u8,
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub interface: bool,
}

/// A bootstrapped call site or dynamic constant
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapCall {
    pub name: String,
    pub descriptor: String,
    pub bootstrap: Handle,
    pub arguments: Vec<Constant>,
}

/// Where an annotation was attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationSite {
    Class,
    Field,
    Method,
    Parameter(u8),
    /// Type annotation; `target` is the JVM `target_type` byte
    TypeUse { target: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type
    pub descriptor: String,
    pub visible: bool,
    pub elements: Vec<(String, ElementValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(Constant),
    Enum { descriptor: String, constant: String },
    /// Return descriptor of a class literal (may be `V`)
    Class(String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub major_version: u16,
    pub minor_version: u16,
    pub access: u16,
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub constant: Option<Constant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
}

/// Instructions that reference other types
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `new`, `anewarray`, `checkcast`, `instanceof`
    Type { opcode: u8, name: String },
    Field {
        opcode: u8,
        owner: String,
        name: String,
        descriptor: String,
    },
    Method {
        opcode: u8,
        owner: String,
        name: String,
        descriptor: String,
        interface: bool,
    },
    InvokeDynamic(BootstrapCall),
    LoadConstant(Constant),
    MultiANewArray { descriptor: String, dimensions: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassEvent {
    Header(ClassHeader),
    Annotation {
        site: AnnotationSite,
        annotation: Annotation,
    },
    Field(FieldInfo),
    Method(MethodInfo),
    AnnotationDefault(ElementValue),
    Instruction { offset: usize, instruction: Instruction },
    TryCatch { catch_type: Option<String> },
    LocalVariable {
        name: String,
        descriptor: Option<String>,
        signature: Option<String>,
    },
}
