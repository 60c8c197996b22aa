// src/registry.rs

use crate::error::BridgeError;
use std::fs;
use std::path::Path;

/// Ordered list of output-port names.
///
/// Loaded exactly once at startup from the port descriptor file and
/// read-only afterwards. Declaration order defines the field order of every
/// outgoing message, so it is preserved exactly.
#[derive(Debug, Clone, Default)]
pub struct PortRegistry {
  names: Vec<String>,
}

impl PortRegistry {
  /// Reads the descriptor file. Any line containing the case-insensitive
  /// substring `OUT` declares an output port; the first whitespace-delimited
  /// token on that line is the port name. A descriptor with no such line is
  /// valid and yields an empty registry.
  pub fn load(path: &Path) -> Result<Self, BridgeError> {
    let contents = fs::read_to_string(path).map_err(|source| BridgeError::Descriptor {
      path: path.to_path_buf(),
      source,
    })?;
    let mut names = Vec::new();
    for line in contents.lines() {
      if !line.to_ascii_lowercase().contains("out") {
        continue;
      }
      if let Some(token) = line.split_whitespace().next() {
        names.push(token.to_string());
      }
    }
    tracing::info!(path = %path.display(), ports = names.len(), "loaded output port registry");
    Ok(Self { names })
  }

  pub fn from_names(names: Vec<String>) -> Self {
    Self { names }
  }

  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use tempfile::NamedTempFile;

  fn descriptor(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn keeps_declaration_order() {
    let file = descriptor("b OUT 1\nclk IN 1\na out 2\n");
    let registry = PortRegistry::load(file.path()).unwrap();
    assert_eq!(registry.names(), ["b", "a"]);
  }

  #[test]
  fn matches_out_case_insensitively() {
    let file = descriptor("q Out 1\n");
    let registry = PortRegistry::load(file.path()).unwrap();
    assert_eq!(registry.names(), ["q"]);
  }

  #[test]
  fn no_out_lines_yield_empty_registry() {
    let file = descriptor("clk IN 1\nrst IN 1\n");
    let registry = PortRegistry::load(file.path()).unwrap();
    assert!(registry.is_empty());
  }

  #[test]
  fn missing_file_is_a_configuration_error() {
    let err = PortRegistry::load(Path::new("/nonexistent/connection_info.txt")).unwrap_err();
    assert!(matches!(err, BridgeError::Descriptor { .. }));
  }
}
