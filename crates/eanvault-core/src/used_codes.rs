use crate::code::Ean13;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

/// The set of every code issued so far.
///
/// Membership is by value. Insertion order is kept for display and export
/// only; it carries no meaning for uniqueness.
#[derive(Debug, Clone, Default)]
pub struct UsedCodes {
    order: Vec<Ean13>,
    members: HashSet<Ean13>,
}

impl UsedCodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: Vec::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    pub fn contains(&self, code: &Ean13) -> bool {
        self.members.contains(code)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Inserts a code. Returns `false` if it was already present.
    pub fn insert(&mut self, code: Ean13) -> bool {
        if self.members.contains(&code) {
            return false;
        }
        self.members.insert(code.clone());
        self.order.push(code);
        true
    }

    /// Inserts every new code from `incoming` and returns how many were added.
    pub fn extend_unique<I>(&mut self, incoming: I) -> usize
    where
        I: IntoIterator<Item = Ean13>,
    {
        incoming
            .into_iter()
            .filter(|code| self.insert(code.clone()))
            .count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ean13> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[Ean13] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<Ean13> {
        self.order
    }
}

/// Set union of `existing` and `incoming`, without duplicates.
///
/// Existing members keep their order; new codes follow in first-seen order.
pub fn merge<I>(existing: &UsedCodes, incoming: I) -> UsedCodes
where
    I: IntoIterator<Item = Ean13>,
{
    let mut merged = existing.clone();
    merged.extend_unique(incoming);
    merged
}

impl PartialEq for UsedCodes {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for UsedCodes {}

impl FromIterator<Ean13> for UsedCodes {
    fn from_iter<T: IntoIterator<Item = Ean13>>(iter: T) -> Self {
        let mut codes = UsedCodes::new();
        codes.extend_unique(iter);
        codes
    }
}

impl IntoIterator for UsedCodes {
    type Item = Ean13;
    type IntoIter = std::vec::IntoIter<Ean13>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

impl<'a> IntoIterator for &'a UsedCodes {
    type Item = &'a Ean13;
    type IntoIter = std::slice::Iter<'a, Ean13>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

impl Serialize for UsedCodes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.order.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UsedCodes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let codes = Vec::<Ean13>::deserialize(deserializer)?;
        Ok(codes.into_iter().collect())
    }
}
