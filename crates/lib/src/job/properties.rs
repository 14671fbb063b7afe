//! Property binding.
//!
//! Each template declares the properties it reads by dotted name
//! (`web.port`). The value at that path in the job's properties, merged over
//! the deployment's global ones, wins; otherwise the declared default is used.
//! A job whose templates declare nothing receives its properties unfiltered.

use serde_yaml::{Mapping, Value};

use crate::release::JobTemplateDefinition;

/// Properties for a job built from `templates`.
///
/// `source` is the result of [`merge_properties`].
pub fn bind_properties(templates: &[&JobTemplateDefinition], source: &Mapping) -> Mapping {
  if templates.iter().all(|t| t.properties.is_none()) {
    return source.clone();
  }

  let mut bound = Mapping::new();
  for template in templates {
    let Some(declared) = &template.properties else {
      continue;
    };
    for (name, schema) in declared {
      let value = lookup(source, name).or(schema.default.as_ref());
      if let Some(value) = value {
        insert(&mut bound, name, value.clone());
      }
    }
  }
  bound
}

/// Deep merge of `overlay` over `base`.
///
/// Nested mappings are merged key by key; any other value in `overlay`
/// replaces the one in `base`.
pub fn merge_properties(base: &Mapping, overlay: &Mapping) -> Mapping {
  let mut merged = base.clone();
  for (key, value) in overlay {
    let combined = match (merged.get(key), value) {
      (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => Value::Mapping(merge_properties(existing, incoming)),
      _ => value.clone(),
    };
    merged.insert(key.clone(), combined);
  }
  merged
}

/// Value at a dotted path, `None` if any segment is missing.
pub fn lookup<'a>(root: &'a Mapping, path: &str) -> Option<&'a Value> {
  let mut segments = path.split('.');
  let first = segments.next()?;
  let mut current = root.get(first)?;
  for segment in segments {
    current = current.as_mapping()?.get(segment)?;
  }
  Some(current)
}

/// Set the value at a dotted path, creating intermediate mappings.
pub fn insert(root: &mut Mapping, path: &str, value: Value) {
  let segments: Vec<&str> = path.split('.').collect();
  insert_segments(root, &segments, value);
}

fn insert_segments(map: &mut Mapping, segments: &[&str], value: Value) {
  match segments {
    [] => {}
    [last] => {
      map.insert(Value::from(*last), value);
    }
    [first, rest @ ..] => {
      let entry = map
        .entry(Value::from(*first))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
      // A scalar in the way is replaced.
      if !entry.is_mapping() {
        *entry = Value::Mapping(Mapping::new());
      }
      if let Value::Mapping(child) = entry {
        insert_segments(child, rest, value);
      }
    }
  }
}
