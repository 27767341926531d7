use std::fmt;

/// A single eviction to admit: the target pod and the dry-run flag.
///
/// Created per admission call and dropped with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvictionRequest {
    pub namespace: String,
    /// Name of the pod being evicted.
    pub name: String,
    /// Validate only; nothing the admitter writes may persist.
    pub dry_run: bool,
}

impl EvictionRequest {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl fmt::Display for EvictionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)?;
        if self.dry_run {
            f.write_str(" (dry-run)")?;
        }
        Ok(())
    }
}
