use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::env::Environment;
use crate::error::Error;
use crate::infer::{Inference, coerce};
use crate::model::{Entry, MalformedLines, SubstitutionMode};
use crate::parser::parse_str_with_mode;
use crate::value::{Kind, Value};

const DEFAULT_PATH: &str = ".env";

/// Builder-style loader producing an [`EnvStore`].
#[derive(Debug, Clone)]
pub struct EnvLoader {
    path: PathBuf,
    substitution_mode: SubstitutionMode,
    malformed_lines: MalformedLines,
    environment: Environment,
    inference: Inference,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    pub fn substitution_mode(mut self, substitution_mode: SubstitutionMode) -> Self {
        self.substitution_mode = substitution_mode;
        self
    }

    pub fn malformed_lines(mut self, malformed_lines: MalformedLines) -> Self {
        self.malformed_lines = malformed_lines;
        self
    }

    /// Variables used to expand `$VAR` and `${VAR}` placeholders.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// chrono format used when inferring date-time values.
    pub fn datetime_format(mut self, format: impl Into<String>) -> Self {
        self.inference = self.inference.datetime_format(format);
        self
    }

    /// Read and parse the file without building a store.
    pub fn parse_only(&self) -> Result<Vec<Entry>, Error> {
        let bytes = std::fs::read(&self.path).map_err(|source| Error::Io {
            path: self.path.clone(),
            source,
        })?;
        let content = std::str::from_utf8(&bytes).map_err(|source| Error::InvalidEncoding {
            path: self.path.clone(),
            source,
        })?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut entries = parse_str_with_mode(content, self.malformed_lines)?;
        self.apply_substitution(&mut entries);
        Ok(entries)
    }

    /// Load the file into a store. Failures are recorded on the store.
    pub fn load(&self) -> EnvStore {
        debug!(path = %self.path.display(), "loading env file");
        match self.parse_only() {
            Ok(entries) => {
                debug!(path = %self.path.display(), entries = entries.len(), "loaded env file");
                EnvStore::from_entries(self.path.clone(), entries, self.inference.clone())
            }
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "env file not loaded");
                EnvStore::failed(self.path.clone(), err, self.inference.clone())
            }
        }
    }

    fn apply_substitution(&self, entries: &mut [Entry]) {
        if self.substitution_mode == SubstitutionMode::Disabled {
            return;
        }

        for entry in entries.iter_mut() {
            entry.value = expand_template(&entry.value, |name, token| {
                self.environment
                    .get_var(name)
                    .unwrap_or_else(|| token.to_owned())
            });
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            substitution_mode: SubstitutionMode::Expand,
            malformed_lines: MalformedLines::Abort,
            environment: Environment::snapshot(),
            inference: Inference::default(),
        }
    }
}

/// Immutable key/value store loaded from one `.env` file.
///
/// A store whose file could not be loaded keeps the error and answers every
/// lookup with `None`.
#[derive(Debug)]
pub struct EnvStore {
    path: PathBuf,
    entries: Vec<Entry>,
    by_key: HashMap<String, usize>,
    error: Option<Error>,
    inference: Inference,
}

impl EnvStore {
    /// Load `.env` from the current working directory.
    pub fn dotenv() -> Self {
        Self::open(DEFAULT_PATH)
    }

    /// Load a file with default settings.
    pub fn open(path: impl AsRef<Path>) -> Self {
        EnvLoader::new().path(path).load()
    }

    fn from_entries(path: PathBuf, entries: Vec<Entry>, inference: Inference) -> Self {
        let by_key = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.key.clone(), idx))
            .collect();
        Self {
            path,
            entries,
            by_key,
            error: None,
            inference,
        }
    }

    fn failed(path: PathBuf, error: Error, inference: Inference) -> Self {
        Self {
            path,
            entries: Vec::new(),
            by_key: HashMap::new(),
            error: Some(error),
            inference,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Raw entries in file order, after quote stripping and substitution.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Raw string value for `key`.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.by_key
            .get(key)
            .map(|&idx| self.entries[idx].value.as_str())
    }

    /// Every key in file order with its inferred value. Empty values map to `None`.
    pub fn get_all(&self) -> Vec<(String, Option<Value>)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), self.inference.infer(&entry.value)))
            .collect()
    }

    pub fn inference(&self) -> &Inference {
        &self.inference
    }

    /// String value for `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_as(key, Kind::String)
    }

    pub fn get_as(&self, key: &str, kind: Kind) -> Option<Value> {
        coerce(self.resolve(key, None)?, kind)
    }

    /// Like [`get_as`](Self::get_as), falling back to `default` when `key` is missing.
    pub fn get_or(&self, key: &str, kind: Kind, default: &str) -> Option<Value> {
        coerce(self.resolve(key, Some(default))?, kind)
    }

    /// Lookup with the kind given by name.
    ///
    /// A recognized name coerces as [`coerce`] does; an unrecognized one
    /// falls back to inference.
    pub fn get_named(&self, key: &str, kind: &str, default: Option<&str>) -> Option<Value> {
        let token = self.resolve(key, default)?;
        match kind.parse::<Kind>() {
            Ok(kind) => coerce(token, kind),
            Err(_) => self.inference.infer(token),
        }
    }

    /// Raw token for `key` or `default`. Empty tokens count as missing.
    fn resolve<'a>(&'a self, key: &str, default: Option<&'a str>) -> Option<&'a str> {
        if self.error.is_some() {
            return None;
        }
        self.raw(key).or(default).filter(|token| !token.is_empty())
    }
}

fn expand_template<F>(input: &str, mut resolve: F) -> String
where
    F: FnMut(&str, &str) -> String,
{
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0usize;
    let mut idx = 0usize;
    let bytes = input.as_bytes();

    while idx < bytes.len() {
        if bytes[idx] != b'$' {
            idx += 1;
            continue;
        }

        let Some((name_start, name_end, token_end)) = parse_placeholder(input, idx) else {
            idx += 1;
            continue;
        };

        let name = &input[name_start..name_end];
        let token = &input[idx..token_end];

        out.push_str(&input[cursor..idx]);
        out.push_str(&resolve(name, token));

        cursor = token_end;
        idx = token_end;
    }

    out.push_str(&input[cursor..]);
    out
}

/// Locate `${NAME}` or `$NAME` at `start`.
///
/// Returns the name range and the end of the whole placeholder.
fn parse_placeholder(input: &str, start: usize) -> Option<(usize, usize, usize)> {
    let bytes = input.as_bytes();
    if start + 1 >= bytes.len() {
        return None;
    }

    if bytes[start + 1] == b'{' {
        let name_start = start + 2;
        let name_end = name_start + input[name_start..].find('}')?;
        if name_end == name_start {
            return None;
        }
        return Some((name_start, name_end, name_end + 1));
    }

    let name_start = start + 1;
    let mut name_end = name_start;
    while name_end < bytes.len() && is_var_char(bytes[name_end]) {
        name_end += 1;
    }
    if name_end == name_start {
        return None;
    }

    Some((name_start, name_end, name_end))
}

fn is_var_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
