use std::collections::BTreeMap;

/// Variables that `$VAR` and `${VAR}` placeholders resolve against.
///
/// The loader never reaches into the process environment on its own; it asks
/// whichever `Environment` it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    kind: EnvironmentKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EnvironmentKind {
    /// Read through [`std::env::var_os`] at lookup time.
    Process,
    /// Read from an in-memory map.
    Memory(BTreeMap<String, String>),
}

impl Default for Environment {
    fn default() -> Self {
        Self::process()
    }
}

impl Environment {
    /// Resolve against the current process environment.
    pub fn process() -> Self {
        Self {
            kind: EnvironmentKind::Process,
        }
    }

    /// Resolve against an empty map, so every placeholder stays untouched.
    pub fn empty() -> Self {
        Self::from_memory(BTreeMap::new())
    }

    /// Resolve against an in-memory map.
    pub fn from_memory(map: BTreeMap<String, String>) -> Self {
        Self {
            kind: EnvironmentKind::Memory(map),
        }
    }

    /// Copy the current process environment into memory.
    pub fn snapshot() -> Self {
        let map = std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Self::from_memory(map)
    }

    pub fn as_memory(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            EnvironmentKind::Memory(map) => Some(map),
            EnvironmentKind::Process => None,
        }
    }

    pub fn get_var(&self, key: &str) -> Option<String> {
        match &self.kind {
            EnvironmentKind::Process => {
                std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
            }
            EnvironmentKind::Memory(map) => map.get(key).cloned(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_memory(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_lookup() {
        let env: Environment = [("HOME", "/home/app")].into_iter().collect();
        assert_eq!(env.get_var("HOME").as_deref(), Some("/home/app"));
        assert_eq!(env.get_var("MISSING"), None);
        assert_eq!(env.as_memory().map(BTreeMap::len), Some(1));
    }

    #[test]
    fn empty_has_no_variables() {
        assert_eq!(Environment::empty().get_var("PATH"), None);
    }

    #[test]
    fn process_is_not_memory_backed() {
        assert!(Environment::process().as_memory().is_none());
        assert!(Environment::snapshot().as_memory().is_some());
    }
}
