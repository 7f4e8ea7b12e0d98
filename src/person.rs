// 👤 Person Registry - Ordered, id-addressed list of personal debts
//
// "The id is IDENTITY (never reused), name/debt/payment are VALUES (edited in place)"
//
// Problem solved:
// - Persons are added and removed at arbitrary points from the UI
// - A deleted id is never handed out again, so a widget still bound to an old id
//   can never end up editing a different person
// - Removal never reorders the remaining entries

use serde::{Deserialize, Serialize};

use crate::amount;

/// Identity of a person entry inside one session
pub type PersonId = u64;

// ============================================================================
// PERSON ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonEntry {
    /// Stable identity, assigned once by the registry
    pub id: PersonId,

    /// Free text, empty until the user types something
    pub name: String,

    /// Outstanding debt with this person (display only, never summed into expenses)
    pub total_debt: f64,

    /// Amount paid to this person every month
    pub monthly_payment: f64,
}

impl PersonEntry {
    fn new(id: PersonId) -> Self {
        PersonEntry {
            id,
            name: String::new(),
            total_debt: 0.0,
            monthly_payment: 0.0,
        }
    }

    /// Apply a single field edit
    pub fn apply(&mut self, field: PersonField) {
        match field {
            PersonField::Name(name) => self.name = name,
            PersonField::TotalDebt(value) => self.total_debt = amount::sanitize(value),
            PersonField::MonthlyPayment(value) => self.monthly_payment = amount::sanitize(value),
        }
    }
}

// ============================================================================
// FIELD EDITS
// ============================================================================

/// One editable field of a person entry, carrying its new value
#[derive(Debug, Clone, PartialEq)]
pub enum PersonField {
    Name(String),
    TotalDebt(f64),
    MonthlyPayment(f64),
}

impl PersonField {
    /// Build an edit from the wire form used by the web page: a field key plus a raw value.
    ///
    /// Numeric fields go through the lenient amount parser, so garbage becomes 0.
    /// Returns None for an unknown field key.
    pub fn from_raw(field: &str, value: &serde_json::Value) -> Option<Self> {
        match field {
            "name" => Some(PersonField::Name(match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            })),
            "total_debt" | "totalDebt" => Some(PersonField::TotalDebt(amount::from_json(value))),
            "monthly_payment" | "monthlyPayment" => {
                Some(PersonField::MonthlyPayment(amount::from_json(value)))
            }
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            PersonField::Name(_) => "name",
            PersonField::TotalDebt(_) => "total_debt",
            PersonField::MonthlyPayment(_) => "monthly_payment",
        }
    }
}

// ============================================================================
// PERSON REGISTRY
// ============================================================================

/// Ordered collection of person entries for one session
///
/// Ids come from a counter that only moves forward, independent of how many
/// entries are currently live.
#[derive(Debug, Clone, Default)]
pub struct PersonRegistry {
    entries: Vec<PersonEntry>,
    next_id: PersonId,
}

impl PersonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a blank entry and return its freshly assigned id
    pub fn add_person(&mut self) -> PersonId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(PersonEntry::new(id));
        tracing::debug!(person_id = id, live = self.entries.len(), "person added");
        id
    }

    /// Remove the entry with this id. Unknown ids are tolerated and leave the registry untouched.
    ///
    /// Returns whether an entry was actually removed.
    pub fn remove_person(&mut self, id: PersonId) -> bool {
        match self.entries.iter().position(|p| p.id == id) {
            Some(index) => {
                // Vec::remove shifts the tail down, keeping relative order
                self.entries.remove(index);
                tracing::debug!(person_id = id, live = self.entries.len(), "person removed");
                true
            }
            None => {
                tracing::debug!(person_id = id, "remove ignored, unknown person");
                false
            }
        }
    }

    /// Set one field on the entry with this id. No-op if the id is absent.
    ///
    /// Returns whether an entry was updated.
    pub fn update_field(&mut self, id: PersonId, field: PersonField) -> bool {
        match self.entries.iter_mut().find(|p| p.id == id) {
            Some(entry) => {
                tracing::debug!(person_id = id, field = field.key(), "person updated");
                entry.apply(field);
                true
            }
            None => false,
        }
    }

    /// Monthly payments of every live entry, in registry order
    pub fn list_payments(&self) -> Vec<f64> {
        self.entries.iter().map(|p| p.monthly_payment).collect()
    }

    /// Sum of all debts, for display next to the person list
    pub fn total_debt(&self) -> f64 {
        self.entries.iter().map(|p| p.total_debt).sum()
    }

    pub fn get(&self, id: PersonId) -> Option<&PersonEntry> {
        self.entries.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PersonId) -> bool {
        self.get(id).is_some()
    }

    pub fn entries(&self) -> &[PersonEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
