use serde::{Deserialize, Serialize};

/// Prefix-based predicate over type names, used both for root selection and
/// for the system namespace.
///
/// A name matches when it starts with one of `prefixes`, starts with none of
/// `except_prefixes`, and its outer class (the part before the first `$`) is
/// not listed in `except_classes`. Entries may be written in slash or dot
/// form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameFilter {
    pub prefixes: Vec<String>,
    pub except_prefixes: Vec<String>,
    pub except_classes: Vec<String>,
}

impl NameFilter {
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
        .normalized()
    }

    /// Default system namespace: the platform runtime
    pub fn system_default() -> Self {
        Self::with_prefixes(["java.", "javax."])
    }

    /// Rewrite every entry to dot form
    pub fn normalized(mut self) -> Self {
        for list in [&mut self.prefixes, &mut self.except_prefixes, &mut self.except_classes] {
            for entry in list.iter_mut() {
                *entry = entry.replace('/', ".");
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// `name` must be in dot form
    pub fn matches(&self, name: &str) -> bool {
        if !self.prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return false;
        }
        if self.except_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return false;
        }
        let outer = name.split('$').next().unwrap_or(name);
        !self.except_classes.iter().any(|c| c == outer)
    }
}
