use std::collections::{HashMap, HashSet};

use crate::plan::Step;

/// Dependency structure of a locked plan, keyed by output key.
#[derive(Debug, Clone)]
pub struct Graph {
  /// output_key -> output keys of the steps that consume it.
  adjacency: HashMap<String, Vec<String>>,
  /// output_key -> output keys it consumes.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Steps with no inputs, in plan order.
  entry_points: Vec<String>,
  /// Steps with more than one input.
  join_points: HashSet<String>,
}

impl Graph {
  /// Build a graph from validated steps.
  pub fn new(steps: &[Step]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for step in steps {
      adjacency.entry(step.output_key.clone()).or_default();
      reverse_adjacency
        .entry(step.output_key.clone())
        .or_default()
        .extend(step.input_keys.iter().cloned());
      for input in &step.input_keys {
        adjacency
          .entry(input.clone())
          .or_default()
          .push(step.output_key.clone());
      }
    }

    let entry_points = steps
      .iter()
      .filter(|s| s.input_keys.is_empty())
      .map(|s| s.output_key.clone())
      .collect();

    let join_points = steps
      .iter()
      .filter(|s| s.input_keys.len() > 1)
      .map(|s| s.output_key.clone())
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
    }
  }

  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Steps that directly consume `output_key`.
  pub fn downstream(&self, output_key: &str) -> &[String] {
    self
      .adjacency
      .get(output_key)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Outputs that `output_key`'s step directly consumes.
  pub fn upstream(&self, output_key: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(output_key)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Every step that depends on `output_key`, directly or transitively.
  pub fn transitive_downstream(&self, output_key: &str) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut stack: Vec<&str> = vec![output_key];
    while let Some(key) = stack.pop() {
      for next in self.downstream(key) {
        if seen.insert(next.clone()) {
          stack.push(next);
        }
      }
    }
    seen
  }

  pub fn is_join_point(&self, output_key: &str) -> bool {
    self.join_points.contains(output_key)
  }

  pub fn join_points(&self) -> &HashSet<String> {
    &self.join_points
  }
}
