//! Dependency ordering of registered models.
//!
//! Models are ordered by a depth-first post-order walk over their foreign
//! references: every referenced model is emitted before the models that
//! reference it. Creating tables in this order and dropping them in reverse
//! keeps foreign-key constraints satisfied.
//!
//! The walk tolerates reference cycles. A model already on the current path
//! is not revisited, so a cycle still yields an order, but one in which some
//! reference necessarily points forward. Such cycles are reported in
//! [`Resolution::cycles`] rather than resolved.

use std::collections::HashMap;

use crate::model::{MetaModel, ModelRegistry};

/// Ordered models and detected reference cycles.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Models in creation order.
    pub order: Vec<MetaModel>,
    /// Each cycle as the model names along it, first name repeated at the end.
    pub cycles: Vec<Vec<String>>,
}

impl Resolution {
    /// Whether any reference cycle was found.
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Model names in creation order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(MetaModel::name).collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnPath,
    Done,
}

struct Frame<'a> {
    name: &'a str,
    model: &'a MetaModel,
    next_dep: usize,
}

/// Order the registry's models so that referenced models come first.
///
/// Roots are taken in registration order. Foreign names that are not
/// registered are skipped. Self-references are allowed and not reported as
/// cycles.
pub fn resolve(registry: &ModelRegistry) -> Resolution {
    let models = registry.snapshot();
    let mut state: HashMap<&str, Visit> = models
        .keys()
        .map(|name| (name.as_str(), Visit::Unvisited))
        .collect();

    let mut resolution = Resolution {
        order: Vec::with_capacity(models.len()),
        cycles: Vec::new(),
    };
    let mut path: Vec<Frame<'_>> = Vec::new();

    for (root, model) in &models {
        if state[root.as_str()] != Visit::Unvisited {
            continue;
        }
        state.insert(root.as_str(), Visit::OnPath);
        path.push(Frame {
            name: root.as_str(),
            model,
            next_dep: 0,
        });

        while let Some(frame) = path.last_mut() {
            let model = frame.model;
            let deps = model.foreign_models();
            if frame.next_dep == deps.len() {
                state.insert(frame.name, Visit::Done);
                resolution.order.push(model.clone());
                path.pop();
                continue;
            }

            let dep = deps[frame.next_dep].as_str();
            frame.next_dep += 1;
            let from = frame.name;

            let Some((dep_name, dep_model)) = models.get_key_value(dep) else {
                continue;
            };
            match state[dep] {
                Visit::Unvisited => {
                    state.insert(dep_name.as_str(), Visit::OnPath);
                    path.push(Frame {
                        name: dep_name.as_str(),
                        model: dep_model,
                        next_dep: 0,
                    });
                }
                Visit::OnPath if dep != from => {
                    resolution.cycles.push(cycle_along(&path, dep));
                }
                _ => {}
            }
        }
    }

    resolution
}

/// Models in creation order.
pub fn ordered_models(registry: &ModelRegistry) -> Vec<MetaModel> {
    resolve(registry).order
}

fn cycle_along(path: &[Frame<'_>], start: &str) -> Vec<String> {
    let pos = path.iter().position(|f| f.name == start).unwrap_or(0);
    let mut cycle: Vec<String> = path[pos..].iter().map(|f| f.name.to_string()).collect();
    cycle.push(start.to_string());
    cycle
}
