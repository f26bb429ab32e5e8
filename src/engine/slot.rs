//! Property slots and deferred defaults
//!
//! A slot holds one configuration value of a task or extension. It can be set
//! explicitly at any time during configuration, or receive a value from a
//! [`DeferredDefault`] when the scheduler resolves it. Explicit values always
//! win, and a default that produced a value never runs again. Reading a slot
//! whose own default has not run yet fails with `SlotPending`; the default
//! doing the read is retried once that input is resolved.

use crate::engine::extension::{Extension, Extensions};
use crate::error::{ConfigError, ConfigResult, ExecutionError, ExecutionResult};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// A fallback value producer, evaluated lazily during the evaluation phase
pub type DeferredDefault<T> = Box<dyn Fn(&ResolveView<'_>) -> ExecutionResult<T>>;

/// Box a closure as a [`DeferredDefault`]
pub fn deferred<T, F>(f: F) -> DeferredDefault<T>
where
    F: Fn(&ResolveView<'_>) -> ExecutionResult<T> + 'static,
{
    Box::new(f)
}

/// Outcome of one attempt at a default
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Progress {
    /// The slot got a value or is left unset for good
    Settled,
    /// The default read a slot that is still waiting; holds `owner.slot` of that input
    Waiting(String),
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Explicit,
    Default,
}

/// A single named configuration value
pub struct PropertySlot<T> {
    owner: String,
    name: String,
    value: Option<T>,
    origin: Option<Origin>,
    required: bool,
    sealed: bool,
    default: Option<DeferredDefault<T>>,
}

impl<T> PropertySlot<T> {
    /// Create an optional, unset slot
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        PropertySlot {
            owner: owner.into(),
            name: name.into(),
            value: None,
            origin: None,
            required: false,
            sealed: false,
            default: None,
        }
    }

    /// Mark the slot as required
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_explicit(&self) -> bool {
        self.origin == Some(Origin::Explicit)
    }

    pub fn origin(&self) -> Option<Origin> {
        self.origin
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Store an explicit value; it takes precedence over any default
    pub fn set(&mut self, value: T) -> ConfigResult<()> {
        self.ensure_open()?;
        self.value = Some(value);
        self.origin = Some(Origin::Explicit);
        Ok(())
    }

    /// Register the default used if the slot is still unset at resolution
    ///
    /// A later registration replaces an earlier one.
    pub fn set_default(&mut self, default: DeferredDefault<T>) -> ConfigResult<()> {
        self.ensure_open()?;
        self.default = Some(default);
        Ok(())
    }

    /// Resolve the slot against a view that does not contain the slot itself
    ///
    /// A default whose inputs are unset leaves the slot unset. One whose inputs
    /// are still waiting for their defaults stays registered.
    pub fn resolve(&mut self, view: &ResolveView<'_>) -> ExecutionResult<()> {
        if let Some(default) = self.take_default() {
            let result = default(view);
            self.finish(default, result)?;
        }
        Ok(())
    }

    /// Read the resolved value
    pub fn get(&self) -> ExecutionResult<&T> {
        match &self.value {
            Some(value) => Ok(value),
            None if self.default.is_some() => Err(ExecutionError::SlotPending {
                owner: self.owner.clone(),
                slot: self.name.clone(),
            }),
            None => Err(ExecutionError::SlotNotReady {
                owner: self.owner.clone(),
                slot: self.name.clone(),
            }),
        }
    }

    /// Read the value, `None` if the slot stays unset; fails while its default is pending
    pub(crate) fn lookup(&self) -> ExecutionResult<Option<&T>> {
        match self.get() {
            Ok(value) => Ok(Some(value)),
            Err(ExecutionError::SlotNotReady { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read the value if there is one
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Fail if the slot is required but has no value
    pub fn check_required(&self) -> ConfigResult<()> {
        if self.required && self.value.is_none() {
            return Err(ConfigError::MissingRequiredProperty {
                owner: self.owner.clone(),
                slot: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Forbid further configuration
    pub fn seal(&mut self) {
        self.sealed = true;
        self.default = None;
    }

    /// Take the pending default out of the slot; an explicit value discards it unread
    pub(crate) fn take_default(&mut self) -> Option<DeferredDefault<T>> {
        let default = self.default.take();
        if self.value.is_some() {
            return None;
        }
        default
    }

    /// Record the result of a default taken with [`PropertySlot::take_default`]
    ///
    /// A default that hit a pending input is put back for another attempt.
    pub(crate) fn finish(
        &mut self,
        default: DeferredDefault<T>,
        result: ExecutionResult<T>,
    ) -> ExecutionResult<Progress> {
        match result {
            Err(ExecutionError::SlotPending { owner, slot }) => {
                self.default = Some(default);
                Ok(Progress::Waiting(format!("{}.{}", owner, slot)))
            }
            result => {
                if let Some(value) = settle(&self.owner, &self.name, result)? {
                    self.store_default(value);
                }
                Ok(Progress::Settled)
            }
        }
    }

    pub(crate) fn store_default(&mut self, value: T) {
        if self.value.is_none() {
            self.value = Some(value);
            self.origin = Some(Origin::Default);
        }
    }

    fn ensure_open(&self) -> ConfigResult<()> {
        if self.sealed {
            return Err(ConfigError::LateConfiguration {
                owner: self.owner.clone(),
                slot: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for PropertySlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySlot")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("value", &self.value)
            .field("origin", &self.origin)
            .field("required", &self.required)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// Turn a default whose inputs are missing into "no value"
pub(crate) fn settle<T>(
    owner: &str,
    name: &str,
    result: ExecutionResult<T>,
) -> ExecutionResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ExecutionError::SlotNotReady { owner: from, slot }) => {
            debug!(owner, slot = name, missing = %format!("{}.{}", from, slot), "default left unset");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Dynamic value stored in task and extension slots
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Path(PathBuf),
    Paths(Vec<PathBuf>),
    Int(i64),
    Bool(bool),
}

impl Value {
    /// String form; paths are rendered lossily
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Path(p) => Some(p.display().to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Paths(_) => None,
        }
    }

    pub fn as_path(&self) -> Option<PathBuf> {
        match self {
            Value::Path(p) => Some(p.clone()),
            Value::Str(s) => Some(PathBuf::from(s)),
            _ => None,
        }
    }

    pub fn as_paths(&self) -> Option<Vec<PathBuf>> {
        match self {
            Value::Paths(paths) => Some(paths.clone()),
            Value::Path(p) => Some(vec![p.clone()]),
            Value::Str(s) => Some(std::env::split_paths(s).collect()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Str(s) => match s.trim() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Path(_) => "path",
            Value::Paths(_) => "path list",
            Value::Int(_) => "integer",
            Value::Bool(_) => "boolean",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Paths(paths) => {
                let joined: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "{}", joined.join(if cfg!(windows) { ";" } else { ":" }))
            }
            other => write!(f, "{}", other.as_string().unwrap_or_default()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::Path(p)
    }
}

impl From<&std::path::Path> for Value {
    fn from(p: &std::path::Path) -> Self {
        Value::Path(p.to_path_buf())
    }
}

impl From<Vec<PathBuf>> for Value {
    fn from(paths: Vec<PathBuf>) -> Self {
        Value::Paths(paths)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// The ordered slot map of one task or extension
#[derive(Debug)]
pub struct Slots {
    owner: String,
    entries: Vec<PropertySlot<Value>>,
}

impl Slots {
    pub fn new(owner: impl Into<String>) -> Self {
        Slots {
            owner: owner.into(),
            entries: Vec::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertySlot<Value>> {
        self.entries.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Declare an optional slot; declaring an existing name returns it unchanged
    pub fn declare(&mut self, name: &str) -> &mut PropertySlot<Value> {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.entries.push(PropertySlot::new(self.owner.clone(), name));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    /// Declare a slot that must have a value before the owner executes
    pub fn declare_required(&mut self, name: &str) -> &mut PropertySlot<Value> {
        let slot = self.declare(name);
        slot.set_required(true);
        slot
    }

    pub fn slot(&self, name: &str) -> Option<&PropertySlot<Value>> {
        self.position(name).map(|index| &self.entries[index])
    }

    pub fn slot_mut(&mut self, name: &str) -> ConfigResult<&mut PropertySlot<Value>> {
        match self.position(name) {
            Some(index) => Ok(&mut self.entries[index]),
            None => Err(ConfigError::UnknownProperty {
                owner: self.owner.clone(),
                slot: name.to_string(),
            }),
        }
    }

    /// Set an explicit value on a declared slot
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ConfigResult<()> {
        self.slot_mut(name)?.set(value.into())
    }

    /// Register a default on a declared slot
    pub fn set_default<F>(&mut self, name: &str, f: F) -> ConfigResult<()>
    where
        F: Fn(&ResolveView<'_>) -> ExecutionResult<Value> + 'static,
    {
        self.slot_mut(name)?.set_default(deferred(f))
    }

    /// The resolved value of a slot
    pub fn value(&self, name: &str) -> ExecutionResult<&Value> {
        match self.slot(name) {
            Some(slot) => slot.get(),
            None => Err(ConfigError::UnknownProperty {
                owner: self.owner.clone(),
                slot: name.to_string(),
            }
            .into()),
        }
    }

    /// The resolved value of a slot, or `None` when it stayed unset
    pub fn optional(&self, name: &str) -> ExecutionResult<Option<&Value>> {
        match self.slot(name) {
            Some(slot) => slot.lookup(),
            None => Err(ConfigError::UnknownProperty {
                owner: self.owner.clone(),
                slot: name.to_string(),
            }
            .into()),
        }
    }

    pub fn string(&self, name: &str) -> ExecutionResult<String> {
        let value = self.value(name)?;
        value.as_string().ok_or_else(|| self.mismatch(name, "string", value))
    }

    pub fn path(&self, name: &str) -> ExecutionResult<PathBuf> {
        let value = self.value(name)?;
        value.as_path().ok_or_else(|| self.mismatch(name, "path", value))
    }

    pub fn paths(&self, name: &str) -> ExecutionResult<Vec<PathBuf>> {
        let value = self.value(name)?;
        value.as_paths().ok_or_else(|| self.mismatch(name, "path list", value))
    }

    pub fn int(&self, name: &str) -> ExecutionResult<i64> {
        let value = self.value(name)?;
        value.as_int().ok_or_else(|| self.mismatch(name, "integer", value))
    }

    pub fn boolean(&self, name: &str) -> ExecutionResult<bool> {
        let value = self.value(name)?;
        value.as_bool().ok_or_else(|| self.mismatch(name, "boolean", value))
    }

    pub fn opt_string(&self, name: &str) -> ExecutionResult<Option<String>> {
        match self.optional(name)? {
            Some(value) => value
                .as_string()
                .map(Some)
                .ok_or_else(|| self.mismatch(name, "string", value)),
            None => Ok(None),
        }
    }

    pub fn opt_path(&self, name: &str) -> ExecutionResult<Option<PathBuf>> {
        match self.optional(name)? {
            Some(value) => value
                .as_path()
                .map(Some)
                .ok_or_else(|| self.mismatch(name, "path", value)),
            None => Ok(None),
        }
    }

    /// Resolve every pending default
    ///
    /// Defaults run in declaration order. A default that reads a sibling still
    /// waiting for its own default is retried on the next pass, so declaration
    /// order does not matter. Defaults that wait on each other are a
    /// `CircularDependency`.
    pub fn resolve_all(&mut self, extensions: &Extensions) -> ExecutionResult<()> {
        loop {
            let mut pass = Pass::default();
            for index in 0..self.entries.len() {
                let Some(default) = self.entries[index].take_default() else {
                    continue;
                };
                let result = {
                    let view = ResolveView::new(extensions, Some(&*self));
                    default(&view)
                };
                pass.record(self.finish_default_at(index, default, result)?);
            }
            if pass.finished()? {
                return Ok(());
            }
        }
    }

    /// Check every required slot, reporting the first one without a value
    pub fn check_required(&self) -> ConfigResult<()> {
        self.entries.iter().try_for_each(|slot| slot.check_required())
    }

    pub fn seal(&mut self) {
        for slot in &mut self.entries {
            slot.seal();
        }
    }

    pub(crate) fn take_default_at(&mut self, index: usize) -> Option<DeferredDefault<Value>> {
        self.entries.get_mut(index).and_then(|slot| slot.take_default())
    }

    /// Store the outcome of a default taken with [`Slots::take_default_at`]
    ///
    /// A waiting default reports the edge `owner.slot -> owner.input`.
    pub(crate) fn finish_default_at(
        &mut self,
        index: usize,
        default: DeferredDefault<Value>,
        result: ExecutionResult<Value>,
    ) -> ExecutionResult<Progress> {
        let Some(slot) = self.entries.get_mut(index) else {
            return Ok(Progress::Settled);
        };
        match slot.finish(default, result)? {
            Progress::Waiting(input) => Ok(Progress::Waiting(format!(
                "{}.{} -> {}",
                slot.owner, slot.name, input
            ))),
            Progress::Settled => {
                if let Some(value) = slot.value() {
                    debug!(owner = %slot.owner, slot = %slot.name, value = %value, "resolved default");
                }
                Ok(Progress::Settled)
            }
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|slot| slot.name() == name)
    }

    fn mismatch(&self, name: &str, expected: &str, found: &Value) -> ExecutionError {
        ExecutionError::invalid(
            format!("{}.{}", self.owner, name),
            format!("expected a {}, found a {} ({})", expected, found.kind(), found),
        )
    }
}

/// Bookkeeping for one pass over pending defaults
#[derive(Debug, Default)]
pub(crate) struct Pass {
    settled: usize,
    waiting: Vec<String>,
}

impl Pass {
    pub(crate) fn record(&mut self, progress: Progress) {
        match progress {
            Progress::Settled => self.settled += 1,
            Progress::Waiting(edge) => self.waiting.push(edge),
        }
    }

    /// `true` once nothing is waiting; a pass that settles nothing while
    /// defaults still wait means they wait on each other
    pub(crate) fn finished(self) -> ExecutionResult<bool> {
        if self.waiting.is_empty() {
            return Ok(true);
        }
        if self.settled == 0 {
            return Err(ConfigError::CircularDependency(self.waiting.join(", ")).into());
        }
        Ok(false)
    }
}

/// Read-only view handed to deferred defaults
pub struct ResolveView<'a> {
    extensions: &'a Extensions,
    siblings: Option<&'a Slots>,
}

impl<'a> ResolveView<'a> {
    pub fn new(extensions: &'a Extensions, siblings: Option<&'a Slots>) -> Self {
        ResolveView {
            extensions,
            siblings,
        }
    }

    pub fn extension(&self, name: &str) -> ExecutionResult<&'a Extension> {
        self.extensions
            .get(name)
            .ok_or_else(|| ConfigError::ExtensionNotFound(name.to_string()).into())
    }

    /// Slots of the extension with the given name
    pub fn ext(&self, name: &str) -> ExecutionResult<&'a Slots> {
        Ok(self.extension(name)?.slots())
    }

    /// Slots of the owner being resolved
    pub fn siblings(&self) -> ExecutionResult<&'a Slots> {
        self.siblings.ok_or_else(|| {
            ExecutionError::invalid("siblings", "this default has no owning task or extension")
        })
    }
}
