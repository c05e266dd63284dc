//! QEMU-style `-chardev` option strings.
//!
//! The syntax is `backend[,key=value...]`. A doubled comma (`,,`) inside a
//! value stands for a literal comma, and a bare key after the backend is a
//! boolean flag equal to `on`. Later occurrences of a key override earlier
//! ones.

use std::collections::BTreeMap;

use crate::error::ChardevError;

/// A parsed set of chardev options
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChardevOpts {
    backend: String,
    values: BTreeMap<String, String>,
}

impl ChardevOpts {
    /// Create an option set for `backend` with no other options
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            values: BTreeMap::new(),
        }
    }

    /// Parse an option string such as `string,id=serial0,text=hello`
    pub fn parse(input: &str) -> Result<Self, ChardevError> {
        if input.is_empty() {
            return Err(ChardevError::Opts("empty option string".into()));
        }

        let mut backend = None;
        let mut values = BTreeMap::new();

        for (index, element) in split_elements(input).into_iter().enumerate() {
            match element.split_once('=') {
                Some(("", _)) => {
                    return Err(ChardevError::Opts(format!("empty key in '{}'", element)));
                }
                Some(("backend", value)) => backend = Some(value.to_string()),
                Some((key, value)) => {
                    values.insert(key.to_string(), value.to_string());
                }
                None if index == 0 => backend = Some(element.clone()),
                None if element.is_empty() => {
                    return Err(ChardevError::Opts("empty option element".into()));
                }
                None => {
                    values.insert(element.clone(), "on".to_string());
                }
            }
        }

        match backend {
            Some(backend) if !backend.is_empty() => Ok(Self { backend, values }),
            _ => Err(ChardevError::Opts("no backend specified".into())),
        }
    }

    /// Builder-style setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Interpret an option as a QEMU boolean (`on`/`off`, `yes`/`no`, `true`/`false`)
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ChardevError> {
        match self.get(key) {
            None => Ok(None),
            Some("on" | "yes" | "true") => Ok(Some(true)),
            Some("off" | "no" | "false") => Ok(Some(false)),
            Some(other) => Err(ChardevError::Opts(format!(
                "parameter '{}' expects 'on' or 'off', got '{}'",
                key, other
            ))),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Split on single commas, turning `,,` into a literal comma
fn split_elements(input: &str) -> Vec<String> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ',' {
            if chars.peek() == Some(&',') {
                chars.next();
                current.push(',');
            } else {
                elements.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    elements.push(current);
    elements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_and_values() {
        let opts = ChardevOpts::parse("string,id=serial0,text=hello").unwrap();
        assert_eq!(opts.backend(), "string");
        assert_eq!(opts.id(), Some("serial0"));
        assert_eq!(opts.get("text"), Some("hello"));
        assert_eq!(opts.get("outputdev"), None);
    }

    #[test]
    fn test_parse_explicit_backend_key() {
        let opts = ChardevOpts::parse("id=c0,backend=string,text=x").unwrap();
        assert_eq!(opts.backend(), "string");
        assert_eq!(opts.id(), Some("c0"));
    }

    #[test]
    fn test_parse_escaped_comma() {
        let opts = ChardevOpts::parse("string,text=a,,b,,c,id=x").unwrap();
        assert_eq!(opts.get("text"), Some("a,b,c"));
        assert_eq!(opts.id(), Some("x"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let opts = ChardevOpts::parse("string,text=k=v").unwrap();
        assert_eq!(opts.get("text"), Some("k=v"));
    }

    #[test]
    fn test_later_key_overrides() {
        let opts = ChardevOpts::parse("string,text=one,text=two").unwrap();
        assert_eq!(opts.get("text"), Some("two"));
    }

    #[test]
    fn test_bare_flag_is_on() {
        let opts = ChardevOpts::parse("string,logappend").unwrap();
        assert_eq!(opts.get_bool("logappend").unwrap(), Some(true));
        assert_eq!(opts.get_bool("missing").unwrap(), None);
    }

    #[test]
    fn test_bad_bool() {
        let opts = ChardevOpts::parse("string,logappend=maybe").unwrap();
        assert!(opts.get_bool("logappend").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(ChardevOpts::parse("").is_err());
        assert!(ChardevOpts::parse("id=x,text=y").is_err());
        assert!(ChardevOpts::parse("string,=v").is_err());
        assert!(ChardevOpts::parse("string,id=x,,").is_ok());
        assert!(ChardevOpts::parse("string,id=x,").is_err());
    }

    #[test]
    fn test_builder() {
        let opts = ChardevOpts::new("string").with("id", "a").with("text", "hi");
        assert_eq!(opts.backend(), "string");
        assert_eq!(opts.iter().count(), 2);
    }
}
