/// One projected column: where the value comes from and the key it lands
/// under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    path: String,
    key: String,
}

impl FieldSpec {
    pub fn new(path: &str, key: &str) -> Self {
        Self { path: path.to_string(), key: key.to_string() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A bare path is its own output key.
impl From<&str> for FieldSpec {
    fn from(path: &str) -> Self {
        Self::new(path, path)
    }
}

impl From<String> for FieldSpec {
    fn from(path: String) -> Self {
        Self { key: path.clone(), path }
    }
}

impl From<(&str, &str)> for FieldSpec {
    fn from((path, key): (&str, &str)) -> Self {
        Self::new(path, key)
    }
}

impl From<(String, String)> for FieldSpec {
    fn from((path, key): (String, String)) -> Self {
        Self { path, key }
    }
}
