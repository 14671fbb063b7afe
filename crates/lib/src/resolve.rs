//! Package dependency resolution.
//!
//! Produces an install order where every package comes after all of its
//! dependencies. Resolution is a depth-first walk from each root that keeps the
//! current ancestor path apart from the completed output:
//!
//! - a dependency already on the ancestor path is a cycle and fails at once
//! - a dependency already completed is skipped, so diamonds resolve once
//! - siblings are visited in declaration order, so the output is deterministic
//!
//! ```text
//! A: []   B: [A]   C: [B]
//! resolve([C]) == [A, B, C]
//! ```

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while ordering packages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
  /// A package transitively depends on itself.
  ///
  /// `path` starts at the first occurrence of the repeated package and ends
  /// with it again, e.g. `[a, b, a]`.
  #[error("cyclic dependency detected: {}", .path.join(" -> "))]
  Cycle { path: Vec<String> },

  /// A package name is not defined in the release.
  #[error("unknown package '{name}'{}", required_by_suffix(.required_by))]
  UnknownPackage {
    name: String,
    required_by: Option<String>,
  },
}

fn required_by_suffix(required_by: &Option<String>) -> String {
  match required_by {
    Some(parent) => format!(" (required by '{}')", parent),
    None => String::new(),
  }
}

struct Walk<'f, F> {
  lookup: &'f F,
  /// Packages on the current recursion path, root first.
  ancestors: Vec<String>,
  done: HashSet<String>,
  order: Vec<String>,
}

impl<F, D> Walk<'_, F>
where
  F: Fn(&str) -> Option<D>,
  D: AsRef<[String]>,
{
  fn visit(&mut self, name: &str, required_by: Option<&str>) -> Result<(), ResolveError> {
    let deps = (self.lookup)(name).ok_or_else(|| ResolveError::UnknownPackage {
      name: name.to_string(),
      required_by: required_by.map(str::to_string),
    })?;

    self.ancestors.push(name.to_string());

    for dep in deps.as_ref() {
      if let Some(start) = self.ancestors.iter().position(|a| a == dep) {
        let mut path = self.ancestors[start..].to_vec();
        path.push(dep.clone());
        return Err(ResolveError::Cycle { path });
      }
      if self.done.contains(dep) {
        trace!(package = %dep, "already resolved");
        continue;
      }
      self.visit(dep, Some(name))?;
    }

    self.ancestors.pop();
    self.done.insert(name.to_string());
    self.order.push(name.to_string());
    Ok(())
  }
}

/// Resolve `roots` and all their transitive dependencies into install order.
///
/// `lookup` returns the declared dependencies of a package, or `None` when the
/// package does not exist.
pub fn resolve<S, F, D>(roots: &[S], lookup: F) -> Result<Vec<String>, ResolveError>
where
  S: AsRef<str>,
  F: Fn(&str) -> Option<D>,
  D: AsRef<[String]>,
{
  let mut walk = Walk {
    lookup: &lookup,
    ancestors: Vec::new(),
    done: HashSet::new(),
    order: Vec::new(),
  };

  for root in roots {
    let root = root.as_ref();
    if walk.done.contains(root) {
      continue;
    }
    walk.visit(root, None)?;
  }

  debug!(roots = roots.len(), resolved = walk.order.len(), "resolved package order");
  Ok(walk.order)
}
