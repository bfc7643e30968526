//! Named, ordered groups of array variables.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::variable::VariableSpec;

/// A named collection of variables sharing one set of I/O commands.
///
/// Variables are stored once in declaration order, and the same storage
/// is indexed by name. Commands refer to variables by their position in
/// the group, which is stable because variables are never removed.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableGroup {
    name: String,
    variables: IndexMap<String, VariableSpec>,
}

impl VariableGroup {
    /// An empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: IndexMap::new(),
        }
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the group has no variables yet.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Append a variable, returning its index.
    ///
    /// Returns the variable back if the name is already taken.
    pub fn insert(&mut self, variable: VariableSpec) -> Result<usize, VariableSpec> {
        match self.variables.entry(variable.name().to_string()) {
            Entry::Occupied(_) => Err(variable),
            Entry::Vacant(slot) => {
                let index = slot.index();
                slot.insert(variable);
                Ok(index)
            }
        }
    }

    /// Position of the variable called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variables.get_index_of(name)
    }

    /// Variable by name.
    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.get(name)
    }

    /// Variable by position.
    pub fn at(&self, index: usize) -> Option<&VariableSpec> {
        self.variables.get_index(index).map(|(_, v)| v)
    }

    /// Variable by position, mutably.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut VariableSpec> {
        self.variables.get_index_mut(index).map(|(_, v)| v)
    }

    /// Variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &VariableSpec> {
        self.variables.values()
    }

    /// Variables in declaration order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VariableSpec> {
        self.variables.values_mut()
    }

    /// Variable names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}
