//! Project-wide extensions
//!
//! An extension is a named bag of slots shared by every task of a project,
//! e.g. the application server layout or the theme settings.

use crate::engine::slot::{Pass, ResolveView, Slots};
use crate::error::{ConfigError, ConfigResult, ExecutionResult};

/// A named set of project-wide slots
#[derive(Debug)]
pub struct Extension {
    name: String,
    slots: Slots,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Extension {
            slots: Slots::new(name.clone()),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut Slots {
        &mut self.slots
    }
}

/// All extensions of a project, in registration order
#[derive(Debug, Default)]
pub struct Extensions {
    entries: Vec<Extension>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension; a name can only be registered once
    pub fn register(&mut self, extension: Extension) -> ConfigResult<&mut Extension> {
        if self.contains(extension.name()) {
            return Err(ConfigError::DuplicateExtension(extension.name().to_string()));
        }
        self.entries.push(extension);
        let index = self.entries.len() - 1;
        Ok(&mut self.entries[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Extension> {
        self.entries.iter().find(|ext| ext.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Extension> {
        self.entries.iter_mut().find(|ext| ext.name() == name)
    }

    /// Slots of a registered extension
    pub fn slots(&self, name: &str) -> ConfigResult<&Slots> {
        self.get(name)
            .map(Extension::slots)
            .ok_or_else(|| ConfigError::ExtensionNotFound(name.to_string()))
    }

    pub fn slots_mut(&mut self, name: &str) -> ConfigResult<&mut Slots> {
        self.get_mut(name)
            .map(Extension::slots_mut)
            .ok_or_else(|| ConfigError::ExtensionNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve extension slots
    ///
    /// Extensions are visited in registration order. A default sees every
    /// extension; one that reads a slot still waiting for its own default,
    /// in any extension, is retried on the next pass.
    pub fn resolve_all(&mut self) -> ExecutionResult<()> {
        loop {
            let mut pass = Pass::default();
            for ext_index in 0..self.entries.len() {
                for slot_index in 0..self.entries[ext_index].slots.len() {
                    let Some(default) = self.entries[ext_index].slots.take_default_at(slot_index)
                    else {
                        continue;
                    };
                    let result = {
                        let view = ResolveView::new(&*self, Some(&self.entries[ext_index].slots));
                        default(&view)
                    };
                    pass.record(
                        self.entries[ext_index]
                            .slots
                            .finish_default_at(slot_index, default, result)?,
                    );
                }
            }
            if pass.finished()? {
                return Ok(());
            }
        }
    }

    pub fn check_required(&self) -> ConfigResult<()> {
        self.entries.iter().try_for_each(|ext| ext.slots.check_required())
    }

    pub fn seal(&mut self) {
        for ext in &mut self.entries {
            ext.slots.seal();
        }
    }
}
