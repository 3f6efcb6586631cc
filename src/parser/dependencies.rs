//! Dependency extraction
//!
//! Turns the event sequence of one decoded class into the set of other type
//! names it references, and caches those sets per class for the whole run.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::class_reader::{decode, DecodedClass};
use super::descriptor::{field_type_class, method_type_classes, object_type_class, return_type_class};
use super::events::*;
use super::signature::signature_classes;
use super::{normalize_class_name, DecodeError};
use crate::config::NameFilter;

/// Direct dependencies of one class, names in dot form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDependencies {
    pub name: String,
    pub dependencies: BTreeSet<String>,
}

/// Decode a class file and extract its dependencies.
///
/// Pure with respect to any shared state, so it can run on worker threads.
pub fn extract(bytes: &[u8], system: &NameFilter) -> Result<UnitDependencies, DecodeError> {
    let class = decode(bytes)?;
    extract_from(&class, system)
}

/// Extract dependencies from an already decoded class
pub fn extract_from(class: &DecodedClass, system: &NameFilter) -> Result<UnitDependencies, DecodeError> {
    let name = normalize_class_name(class.name());
    let mut collector = Collector {
        this: &name,
        system,
        found: BTreeSet::new(),
        dynamic: HashSet::new(),
    };
    for event in class {
        collector.event(event)?;
    }
    let dependencies = collector.found;
    Ok(UnitDependencies { name, dependencies })
}

struct Collector<'a> {
    this: &'a str,
    system: &'a NameFilter,
    found: BTreeSet<String>,
    /// Dynamic constants already walked; bootstrap arguments may share them
    dynamic: HashSet<*const BootstrapCall>,
}

impl Collector<'_> {
    fn event(&mut self, event: &ClassEvent) -> Result<(), DecodeError> {
        match event {
            ClassEvent::Header(header) => {
                // A class signature restates the supertypes with type arguments
                if let Some(signature) = &header.signature {
                    self.signature(signature)?;
                } else {
                    if let Some(super_name) = &header.super_name {
                        self.object(super_name)?;
                    }
                    for interface in &header.interfaces {
                        self.object(interface)?;
                    }
                }
            }
            ClassEvent::Annotation { annotation, .. } => self.annotation(annotation)?,
            ClassEvent::Field(field) => {
                match &field.signature {
                    Some(signature) => self.signature(signature)?,
                    None => self.field_descriptor(&field.descriptor)?,
                }
                if let Some(constant) = &field.constant {
                    self.constant(constant)?;
                }
            }
            ClassEvent::Method(method) => {
                match &method.signature {
                    Some(signature) => self.signature(signature)?,
                    None => self.method_descriptor(&method.descriptor)?,
                }
                for exception in &method.exceptions {
                    self.object(exception)?;
                }
            }
            ClassEvent::AnnotationDefault(value) => self.element(value)?,
            ClassEvent::Instruction { instruction, .. } => self.instruction(instruction)?,
            ClassEvent::TryCatch { catch_type } => {
                if let Some(catch_type) = catch_type {
                    self.object(catch_type)?;
                }
            }
            ClassEvent::LocalVariable { descriptor, signature, .. } => match (signature, descriptor) {
                (Some(signature), _) => self.signature(signature)?,
                (None, Some(descriptor)) => self.field_descriptor(descriptor)?,
                (None, None) => {}
            },
        }
        Ok(())
    }

    fn instruction(&mut self, instruction: &Instruction) -> Result<(), DecodeError> {
        match instruction {
            Instruction::Type { name, .. } => self.object(name),
            Instruction::Field { owner, descriptor, .. } => {
                self.object(owner)?;
                self.field_descriptor(descriptor)
            }
            Instruction::Method { owner, descriptor, .. } => {
                self.object(owner)?;
                self.method_descriptor(descriptor)
            }
            Instruction::InvokeDynamic(call) => self.bootstrap_call(call),
            Instruction::LoadConstant(constant) => self.constant(constant),
            Instruction::MultiANewArray { descriptor, .. } => self.object(descriptor),
        }
    }

    fn add(&mut self, internal_name: &str) {
        let name = internal_name.replace('/', ".");
        if name == self.this || self.system.matches(&name) {
            return;
        }
        self.found.insert(name);
    }

    fn object(&mut self, name: &str) -> Result<(), DecodeError> {
        if let Some(class) = object_type_class(name)? {
            self.add(class);
        }
        Ok(())
    }

    fn field_descriptor(&mut self, descriptor: &str) -> Result<(), DecodeError> {
        if let Some(class) = field_type_class(descriptor)? {
            self.add(class);
        }
        Ok(())
    }

    fn method_descriptor(&mut self, descriptor: &str) -> Result<(), DecodeError> {
        for class in method_type_classes(descriptor)? {
            self.add(class);
        }
        Ok(())
    }

    /// Handles and dynamic constants carry either kind of descriptor
    fn any_descriptor(&mut self, descriptor: &str) -> Result<(), DecodeError> {
        if descriptor.starts_with('(') {
            self.method_descriptor(descriptor)
        } else {
            self.field_descriptor(descriptor)
        }
    }

    fn signature(&mut self, signature: &str) -> Result<(), DecodeError> {
        for class in signature_classes(signature)? {
            self.add(&class);
        }
        Ok(())
    }

    fn constant(&mut self, constant: &Constant) -> Result<(), DecodeError> {
        match constant {
            Constant::Class(name) => self.object(name),
            Constant::MethodType(descriptor) => self.method_descriptor(descriptor),
            Constant::MethodHandle(handle) => self.handle(handle),
            Constant::Dynamic(call) => {
                if self.dynamic.insert(Arc::as_ptr(call)) {
                    self.bootstrap_call(call)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle(&mut self, handle: &Handle) -> Result<(), DecodeError> {
        self.object(&handle.owner)?;
        self.any_descriptor(&handle.descriptor)
    }

    fn bootstrap_call(&mut self, call: &BootstrapCall) -> Result<(), DecodeError> {
        self.any_descriptor(&call.descriptor)?;
        self.handle(&call.bootstrap)?;
        for argument in &call.arguments {
            self.constant(argument)?;
        }
        Ok(())
    }

    fn annotation(&mut self, annotation: &Annotation) -> Result<(), DecodeError> {
        self.field_descriptor(&annotation.descriptor)?;
        for (_, value) in &annotation.elements {
            self.element(value)?;
        }
        Ok(())
    }

    fn element(&mut self, value: &ElementValue) -> Result<(), DecodeError> {
        match value {
            ElementValue::Const(constant) => self.constant(constant),
            ElementValue::Enum { descriptor, .. } => self.field_descriptor(descriptor),
            ElementValue::Class(descriptor) => {
                if let Some(class) = return_type_class(descriptor)? {
                    self.add(class);
                }
                Ok(())
            }
            ElementValue::Annotation(annotation) => self.annotation(annotation),
            ElementValue::Array(values) => values.iter().try_for_each(|v| self.element(v)),
        }
    }
}

/// Outcome of recording one class with the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// First time this class name was seen
    Recorded,
    /// The name was already recorded; the earlier dependencies are kept
    Duplicate,
}

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// Run-wide cache of per-class dependency sets.
///
/// Every class is recorded once, on first visit. Later visits of the same
/// name (the same class in another archive) keep the first recording.
#[derive(Debug, Clone)]
pub struct DependencyExtractor {
    system: NameFilter,
    classes: BTreeSet<String>,
    dependencies: HashMap<String, BTreeSet<String>>,
}

impl DependencyExtractor {
    pub fn new(system: NameFilter) -> Self {
        Self {
            system,
            classes: BTreeSet::new(),
            dependencies: HashMap::new(),
        }
    }

    pub fn system(&self) -> &NameFilter {
        &self.system
    }

    /// Decode and record one class file. Nothing is recorded on error.
    pub fn visit(&mut self, bytes: &[u8]) -> Result<(String, Visit), DecodeError> {
        let unit = extract(bytes, &self.system)?;
        let name = unit.name.clone();
        Ok((name, self.record(unit)))
    }

    /// Record dependencies extracted elsewhere (e.g. on a worker thread)
    pub fn record(&mut self, unit: UnitDependencies) -> Visit {
        if self.classes.contains(&unit.name) {
            debug!("{} already recorded, keeping first definition", unit.name);
            return Visit::Duplicate;
        }
        self.classes.insert(unit.name.clone());
        self.dependencies.insert(unit.name, unit.dependencies);
        Visit::Recorded
    }

    /// Direct dependencies of a class; empty for classes never visited
    pub fn dependencies(&self, name: &str) -> &BTreeSet<String> {
        self.dependencies.get(name).unwrap_or(&EMPTY)
    }

    /// Every class visited so far
    pub fn classes(&self) -> &BTreeSet<String> {
        &self.classes
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for DependencyExtractor {
    fn default() -> Self {
        Self::new(NameFilter::system_default())
    }
}
