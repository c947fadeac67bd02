/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Values carried by fields.
//!
//! Scalars carry a [`ScalarValue`]; groups carry a [`GroupValue`] holding one
//! optional value per child field, in field order; sequences carry a
//! [`SequenceValue`] holding one group value per element.

use ironfast_core::ScalarValue;

/// The value of any field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Value of a scalar or composed scalar.
    Scalar(ScalarValue),
    /// Value of a group.
    Group(GroupValue),
    /// Value of a sequence.
    Sequence(SequenceValue),
}

impl FieldValue {
    /// Returns the scalar value, if this is one.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the group value, if this is one.
    #[must_use]
    pub const fn as_group(&self) -> Option<&GroupValue> {
        match self {
            Self::Group(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the sequence value, if this is one.
    #[must_use]
    pub const fn as_sequence(&self) -> Option<&SequenceValue> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a short name for the kind of value.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(v) => v.kind(),
            Self::Group(_) => "group",
            Self::Sequence(_) => "sequence",
        }
    }
}

impl From<ScalarValue> for FieldValue {
    fn from(value: ScalarValue) -> Self {
        Self::Scalar(value)
    }
}

impl From<GroupValue> for FieldValue {
    fn from(value: GroupValue) -> Self {
        Self::Group(value)
    }
}

impl From<SequenceValue> for FieldValue {
    fn from(value: SequenceValue) -> Self {
        Self::Sequence(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Scalar(ScalarValue::Integer(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Scalar(ScalarValue::from(value))
    }
}

/// Positional values of a group's fields; `None` marks an absent field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupValue {
    values: Vec<Option<FieldValue>>,
}

impl GroupValue {
    /// Creates a group value with `len` absent fields.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    /// Creates a group value from positional values.
    #[must_use]
    pub fn with_values(values: Vec<Option<FieldValue>>) -> Self {
        Self { values }
    }

    /// Returns the value at `index`, or `None` if absent.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Returns the scalar value at `index`, if present and scalar.
    #[must_use]
    pub fn scalar(&self, index: usize) -> Option<&ScalarValue> {
        self.get(index).and_then(FieldValue::as_scalar)
    }

    /// Sets the value at `index`, growing the group if needed.
    pub fn set(&mut self, index: usize, value: impl Into<FieldValue>) {
        self.set_option(index, Some(value.into()));
    }

    /// Marks the value at `index` absent.
    pub fn clear(&mut self, index: usize) {
        self.set_option(index, None);
    }

    /// Sets or clears the value at `index`.
    pub fn set_option(&mut self, index: usize, value: Option<FieldValue>) {
        if index >= self.values.len() {
            self.values.resize(index + 1, None);
        }
        self.values[index] = value;
    }

    /// Returns the number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the group has no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns an iterator over the positional values.
    pub fn iter(&self) -> impl Iterator<Item = Option<&FieldValue>> {
        self.values.iter().map(Option::as_ref)
    }
}

/// The elements of a sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceValue {
    elements: Vec<GroupValue>,
}

impl SequenceValue {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element.
    pub fn push(&mut self, element: GroupValue) {
        self.elements.push(element);
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&GroupValue> {
        self.elements.get(index)
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the sequence has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> impl Iterator<Item = &GroupValue> {
        self.elements.iter()
    }
}

impl From<Vec<GroupValue>> for SequenceValue {
    fn from(elements: Vec<GroupValue>) -> Self {
        Self { elements }
    }
}

impl FromIterator<GroupValue> for SequenceValue {
    fn from_iter<I: IntoIterator<Item = GroupValue>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}
