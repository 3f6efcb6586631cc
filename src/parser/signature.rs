// Generic signature grammar (class, method and field signatures)
//
// Only the class types a signature names matter here, so type variables and
// wildcards are consumed and dropped. Inner classes are reported both as the
// enclosing type and as `Outer$Inner`.

use super::DecodeError;

const MAX_NESTING: usize = 64;

/// Every class type named by a generic signature, in internal form and in
/// order of appearance (duplicates included).
pub fn signature_classes(sig: &str) -> Result<Vec<String>, DecodeError> {
    let mut parser = SignatureParser {
        sig,
        bytes: sig.as_bytes(),
        pos: 0,
        classes: Vec::new(),
    };
    parser.parse()?;
    Ok(parser.classes)
}

struct SignatureParser<'s> {
    sig: &'s str,
    bytes: &'s [u8],
    pos: usize,
    classes: Vec<String>,
}

impl<'s> SignatureParser<'s> {
    fn error(&self) -> DecodeError {
        DecodeError::BadSignature(self.sig.to_owned())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), DecodeError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Consume an identifier up to (not including) any of `stops`
    fn identifier(&mut self, stops: &[u8]) -> Result<&'s str, DecodeError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start || self.pos >= self.bytes.len() {
            return Err(self.error());
        }
        Ok(&self.sig[start..self.pos])
    }

    fn parse(&mut self) -> Result<(), DecodeError> {
        if self.bytes.is_empty() {
            return Err(self.error());
        }

        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }

        if self.peek() == Some(b'(') {
            self.pos += 1;
            while self.peek() != Some(b')') {
                if self.peek().is_none() {
                    return Err(self.error());
                }
                self.java_type(false, 0)?;
            }
            self.pos += 1;
            self.java_type(true, 0)?;
            while self.peek() == Some(b'^') {
                self.pos += 1;
                self.reference_type(0)?;
            }
        } else {
            // Superclass followed by interfaces, or a single field type
            while self.peek().is_some() {
                self.reference_type(0)?;
            }
        }

        if self.pos != self.bytes.len() {
            return Err(self.error());
        }
        Ok(())
    }

    fn type_parameters(&mut self) -> Result<(), DecodeError> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            self.identifier(b":>")?;
            self.expect(b':')?;
            // Class bound may be empty when only interface bounds follow
            if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                self.reference_type(0)?;
            }
            while self.peek() == Some(b':') {
                self.pos += 1;
                self.reference_type(0)?;
            }
            if self.peek().is_none() {
                return Err(self.error());
            }
        }
        self.pos += 1;
        Ok(())
    }

    fn java_type(&mut self, allow_void: bool, depth: usize) -> Result<(), DecodeError> {
        match self.peek() {
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => {
                self.pos += 1;
                Ok(())
            }
            Some(b'V') if allow_void => {
                self.pos += 1;
                Ok(())
            }
            _ => self.reference_type(depth),
        }
    }

    fn reference_type(&mut self, depth: usize) -> Result<(), DecodeError> {
        if depth > MAX_NESTING {
            return Err(DecodeError::TooDeep(MAX_NESTING));
        }
        match self.peek() {
            Some(b'L') => self.class_type(depth),
            Some(b'T') => {
                self.pos += 1;
                self.identifier(b";")?;
                self.expect(b';')
            }
            Some(b'[') => {
                self.pos += 1;
                self.java_type(false, depth + 1)
            }
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self, depth: usize) -> Result<(), DecodeError> {
        self.expect(b'L')?;
        let mut name = self.identifier(b"<.;")?.to_owned();
        self.classes.push(name.clone());
        if self.peek() == Some(b'<') {
            self.type_arguments(depth)?;
        }

        while self.peek() == Some(b'.') {
            self.pos += 1;
            let inner = self.identifier(b"<.;")?;
            name = format!("{}${}", name, inner);
            self.classes.push(name.clone());
            if self.peek() == Some(b'<') {
                self.type_arguments(depth)?;
            }
        }

        self.expect(b';')
    }

    fn type_arguments(&mut self, depth: usize) -> Result<(), DecodeError> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            match self.peek() {
                Some(b'*') => self.pos += 1,
                Some(b'+' | b'-') => {
                    self.pos += 1;
                    self.reference_type(depth + 1)?;
                }
                Some(_) => self.reference_type(depth + 1)?,
                None => return Err(self.error()),
            }
        }
        self.pos += 1;
        Ok(())
    }
}
