// ABOUTME: Variable scope for expression evaluation with nested frames
// ABOUTME: Holds named values plus native functions that only accessor mode may call

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::error::Result;
use crate::value::Value;

/// Native function callable from keep-functions expressions
pub type NativeFunction = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A stack of variable frames. Lookups search from the innermost frame out,
/// so an inner binding shadows an outer one until its frame is popped.
#[derive(Clone)]
pub struct Scope {
    frames: Vec<HashMap<String, Value>>,
    functions: HashMap<String, NativeFunction>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
            functions: HashMap::new(),
        }
    }

    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut scope = Self::new();
        for (name, value) in values {
            scope.set(name, value);
        }
        scope
    }

    /// Bind `name` in the innermost frame
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Drop the innermost frame; the outermost frame is never removed
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn define_function<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        self.functions.insert(name.into(), Rc::new(function));
    }

    pub fn function(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    pub fn has_functions(&self) -> bool {
        !self.functions.is_empty()
    }

    /// Flattened view of every visible variable, inner frames winning
    pub fn visible_values(&self) -> HashMap<String, Value> {
        let mut merged = HashMap::new();
        for frame in &self.frames {
            for (name, value) in frame {
                merged.insert(name.clone(), value.clone());
            }
        }
        merged
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("frames", &self.frames)
            .field("functions", &names)
            .finish()
    }
}
