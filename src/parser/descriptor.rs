// Field and method descriptor grammar
//
// Names are returned in internal (slash) form; callers normalise them.

use super::DecodeError;

fn bad(desc: &str) -> DecodeError {
    DecodeError::BadDescriptor(desc.to_owned())
}

/// Parse one field type starting at `pos`. Returns the referenced class (if
/// any) and the position just past the type.
fn parse_field_type<'d>(desc: &'d str, pos: usize, allow_void: bool) -> Result<(Option<&'d str>, usize), DecodeError> {
    let bytes = desc.as_bytes();
    let mut pos = pos;
    let mut is_array = false;
    while bytes.get(pos) == Some(&b'[') {
        pos += 1;
        is_array = true;
    }

    match bytes.get(pos) {
        Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => Ok((None, pos + 1)),
        Some(b'V') if allow_void && !is_array => Ok((None, pos + 1)),
        Some(b'L') => {
            let start = pos + 1;
            let end = desc[start..].find(';').map(|i| start + i).ok_or_else(|| bad(desc))?;
            if end == start {
                return Err(bad(desc));
            }
            Ok((Some(&desc[start..end]), end + 1))
        }
        _ => Err(bad(desc)),
    }
}

/// Class named by a field descriptor, unwrapping arrays. Primitives yield `None`.
pub fn field_type_class(desc: &str) -> Result<Option<&str>, DecodeError> {
    let (class, end) = parse_field_type(desc, 0, false)?;
    if end != desc.len() {
        return Err(bad(desc));
    }
    Ok(class)
}

/// Like [`field_type_class`] but also accepts `V`, as class literals in
/// annotations do.
pub fn return_type_class(desc: &str) -> Result<Option<&str>, DecodeError> {
    let (class, end) = parse_field_type(desc, 0, true)?;
    if end != desc.len() {
        return Err(bad(desc));
    }
    Ok(class)
}

/// Every class named by a method descriptor's parameters and return type
pub fn method_type_classes(desc: &str) -> Result<Vec<&str>, DecodeError> {
    let bytes = desc.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(bad(desc));
    }

    let mut classes = Vec::new();
    let mut pos = 1;
    loop {
        match bytes.get(pos) {
            Some(b')') => break,
            Some(_) => {
                let (class, next) = parse_field_type(desc, pos, false)?;
                classes.extend(class);
                pos = next;
            }
            None => return Err(bad(desc)),
        }
    }

    let (class, end) = parse_field_type(desc, pos + 1, true)?;
    if end != desc.len() {
        return Err(bad(desc));
    }
    classes.extend(class);
    Ok(classes)
}

/// Class referenced by a `CONSTANT_Class` entry, which holds either an
/// internal name or, for array types, a field descriptor.
pub fn object_type_class(name: &str) -> Result<Option<&str>, DecodeError> {
    if name.starts_with('[') {
        field_type_class(name)
    } else if name.is_empty() {
        Err(bad(name))
    } else {
        Ok(Some(name))
    }
}
