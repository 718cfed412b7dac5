//! Allowlist document: decoding the verified configuration file and matching requests.
//!
//! ```yaml
//! type: exact
//! commands:
//!   - description: git fetch over ssh
//!     path: /usr/bin/git-upload-pack
//!     env:
//!       - GIT_PROTOCOL=version=2
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::io::Read;

use crate::error::GateError;

/// Decoded configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigurationDocument {
    /// Free-form tag. Decoded and kept, but no behaviour depends on it.
    #[serde(rename = "type", default, deserialize_with = "scalar_string")]
    pub kind: String,

    /// Rules in file order; the first matching one wins.
    #[serde(default, deserialize_with = "nullable")]
    pub commands: Vec<CommandEntry>,
}

/// One allowlist rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandEntry {
    /// Documentation only.
    #[serde(default, deserialize_with = "scalar_string")]
    pub description: String,

    /// Compared byte-for-byte with the requested program name; never canonicalized.
    #[serde(default, deserialize_with = "scalar_string")]
    pub path: String,

    /// `KEY=VALUE` assignments appended to the child's inherited environment.
    #[serde(default, deserialize_with = "scalar_strings")]
    pub env: Vec<String>,
}

/// Treat an explicit YAML `null` (e.g. `commands:` with nothing under it) like an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// String field that also accepts numbers and booleans (`description: 2024`), in their
/// canonical text form. `null` is the empty string; sequences and maps are rejected.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_to_string(Value::deserialize(deserializer)?).map_err(D::Error::custom)
}

/// List of strings with the same scalar coercion per item; `null` is the empty list.
fn scalar_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    nullable::<D, Vec<Value>>(deserializer)?
        .into_iter()
        .map(scalar_to_string)
        .collect::<Result<_, _>>()
        .map_err(D::Error::custom)
}

fn scalar_to_string(value: Value) -> Result<String, &'static str> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Err("expected a scalar"),
    }
}

impl CommandEntry {
    /// Well-formed `env` assignments as `(key, value)`, split at the first `=`, in file order.
    /// Entries without `=` or with an empty key are skipped.
    pub fn env_vars(&self) -> Vec<(&str, &str)> {
        self.env
            .iter()
            .enumerate()
            .filter_map(|(i, assignment)| match assignment.split_once('=') {
                Some((key, value)) if !key.is_empty() => Some((key, value)),
                _ => {
                    log::warn!("ignoring env entry {} of an allowlist rule: not KEY=VALUE", i);
                    None
                }
            })
            .collect()
    }
}

impl ConfigurationDocument {
    /// Decode a document from raw file content. An empty or comment-only file is an empty allowlist.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GateError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            log::debug!("configuration is not UTF-8: {}", e);
            GateError::InvalidConfig
        })?;
        if is_blank_document(text) {
            return Ok(Self::default());
        }
        let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
            log::debug!("configuration is not YAML: {}", e);
            GateError::InvalidConfig
        })?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value).map_err(|e| {
            log::debug!("configuration does not match schema: {}", e);
            GateError::InvalidConfig
        })
    }

    /// Index of the first entry whose `path` is exactly `program`.
    pub fn find_entry(&self, program: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.path == program)
    }
}

fn is_blank_document(text: &str) -> bool {
    text.lines().map(str::trim).all(|l| l.is_empty() || l.starts_with('#'))
}

/// Read and decode an already verified configuration file from its open handle.
///
/// The content is read to the end in one go and the handle dropped before decoding.
/// Every read or decode error becomes the same [`GateError::InvalidConfig`].
pub fn read(mut source: impl Read) -> Result<ConfigurationDocument, GateError> {
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes).map_err(|e| {
        log::debug!("reading configuration failed: {}", e);
        GateError::InvalidConfig
    })?;
    drop(source);
    let doc = ConfigurationDocument::from_slice(&bytes)?;
    log::debug!("loaded {} allowlist entries", doc.commands.len());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> ConfigurationDocument {
        ConfigurationDocument::from_slice(yaml.as_bytes()).unwrap()
    }

    #[test]
    fn parses_full_schema() {
        let d = doc(r#"
type: exact
commands:
  - description: git fetch
    path: /usr/bin/git-upload-pack
  - description: rsync with env
    path: /usr/bin/rsync
    env:
      - FOO=bar
      - EMPTY=
"#);
        assert_eq!(d.kind, "exact");
        assert_eq!(d.commands.len(), 2);
        assert_eq!(d.commands[0].path, "/usr/bin/git-upload-pack");
        assert!(d.commands[0].env.is_empty());
        assert_eq!(d.commands[1].description, "rsync with env");
        assert_eq!(d.commands[1].env, vec!["FOO=bar", "EMPTY="]);
    }

    #[test]
    fn missing_or_null_commands_is_empty_allowlist() {
        assert!(doc("type: exact\n").commands.is_empty());
        assert!(doc("type: exact\ncommands:\n").commands.is_empty());
        assert!(doc("").commands.is_empty());
        assert!(doc("# nothing here\n").commands.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let d = doc("version: 3\ncommands:\n  - path: /bin/true\n    shell: yes\n");
        assert_eq!(d.commands[0].path, "/bin/true");
    }

    #[test]
    fn invalid_documents_get_generic_error() {
        for bad in ["commands: [unclosed", "commands: 42", "plain scalar", "commands:\n  - path: [a, b]\n"] {
            let err = ConfigurationDocument::from_slice(bad.as_bytes()).unwrap_err();
            assert!(matches!(err, GateError::InvalidConfig), "{:?}", bad);
            assert_eq!(err.to_string(), "configuration file not valid");
        }
    }

    #[test]
    fn non_utf8_is_invalid() {
        let err = ConfigurationDocument::from_slice(&[0xff, 0xfe, 0x00, b':']).unwrap_err();
        assert!(matches!(err, GateError::InvalidConfig));
    }

    #[test]
    fn find_entry_is_exact_and_first_match_wins() {
        let d = doc(r#"
commands:
  - path: /usr/bin/git-upload-pack
    env: [WHICH=first]
  - path: /usr/bin/git-upload-pack
    env: [WHICH=second]
  - path: git-receive-pack
"#);
        assert_eq!(d.find_entry("/usr/bin/git-upload-pack"), Some(0));
        assert_eq!(d.commands[0].env_vars(), vec![("WHICH", "first")]);
        assert_eq!(d.find_entry("git-receive-pack"), Some(2));
        assert_eq!(d.find_entry("/usr/bin/git-receive-pack"), None);
        assert_eq!(d.find_entry("/USR/BIN/GIT-UPLOAD-PACK"), None);
        assert_eq!(d.find_entry(" /usr/bin/git-upload-pack"), None);
        assert_eq!(d.find_entry("/usr/bin/../bin/git-upload-pack"), None);
    }

    #[test]
    fn empty_allowlist_matches_nothing() {
        assert_eq!(ConfigurationDocument::default().find_entry("/bin/sh"), None);
        assert_eq!(ConfigurationDocument::default().find_entry(""), None);
    }

    #[test]
    fn env_vars_split_on_first_equals_and_skip_malformed() {
        let entry = CommandEntry {
            path: "/bin/true".to_string(),
            env: vec![
                "A=1".to_string(),
                "B=x=y".to_string(),
                "NOEQUALS".to_string(),
                "=orphan".to_string(),
                "C=".to_string(),
            ],
            ..CommandEntry::default()
        };
        assert_eq!(entry.env_vars(), vec![("A", "1"), ("B", "x=y"), ("C", "")]);
    }

    #[test]
    fn numbers_and_booleans_in_string_fields_are_accepted() {
        let d = doc("type: 1\ncommands:\n  - path: /bin/true\n    description: 2024\n    env: [A=1, 7, true]\n");
        assert_eq!(d.kind, "1");
        assert_eq!(d.commands[0].description, "2024");
        assert_eq!(d.commands[0].env, vec!["A=1", "7", "true"]);
        assert_eq!(d.commands[0].env_vars(), vec![("A", "1")]);
    }

    #[test]
    fn null_string_fields_are_empty() {
        let d = doc("type:\ncommands:\n  - path: /bin/true\n    description:\n    env:\n");
        assert_eq!(d.kind, "");
        assert_eq!(d.commands[0].description, "");
        assert!(d.commands[0].env.is_empty());
    }

    #[test]
    fn read_decodes_from_handle_and_reports_errors_generically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.yml");
        std::fs::write(&path, "commands:\n  - path: /bin/echo\n").unwrap();
        let file = std::fs::File::open(&path).unwrap();
        assert_eq!(read(file).unwrap().find_entry("/bin/echo"), Some(0));

        // A directory opens but cannot be read.
        let dir_handle = std::fs::File::open(dir.path()).unwrap();
        let err = read(dir_handle).unwrap_err();
        assert!(matches!(err, GateError::InvalidConfig));
    }
}
