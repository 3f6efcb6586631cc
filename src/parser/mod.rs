// Parser module - reads compiled class files and extracts their dependencies

mod bytes;
mod class_reader;
mod constant_pool;
mod dependencies;
mod descriptor;
mod error;
mod events;
pub mod opcodes;
mod signature;

pub use class_reader::{decode, DecodedClass};
pub use dependencies::{extract, extract_from, DependencyExtractor, UnitDependencies, Visit};
pub use descriptor::{field_type_class, method_type_classes, object_type_class, return_type_class};
pub use error::DecodeError;
pub use events::{
    Annotation, AnnotationSite, BootstrapCall, ClassEvent, ClassHeader, Constant, ElementValue, FieldInfo, Handle,
    Instruction, MethodInfo,
};
pub use signature::signature_classes;

/// Suffix of compiled unit entries
pub const CLASS_SUFFIX: &str = ".class";

/// Normalise a class name from internal (`a/b/C`) or archive path
/// (`a/b/C.class`) form to dot form (`a.b.C`).
pub fn normalize_class_name(name: &str) -> String {
    name.strip_suffix(CLASS_SUFFIX).unwrap_or(name).replace('/', ".")
}
