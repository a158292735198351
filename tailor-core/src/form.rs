//! Form controller
//!
//! Holds the named text inputs of the measurement form and the explicit
//! create/edit mode. Saving validates the required fields, builds a record
//! from the inputs and persists it through the [`RecordStore`].

use anyhow::Result;
use thiserror::Error;

use crate::models::{
    timestamp_now, MeasurementField, MeasurementRecord, Measurements, RecordId, MIN_PHONE_LEN,
};
use crate::storage::KeyValueStorage;
use crate::store::{display_to_storage_index, RecordStore, StoreError};

/// Inputs that must be filled before a save
pub const REQUIRED_FIELDS: [&str; 2] = ["name", "phone"];

/// Why a save was refused
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("phone too short: must be at least {min} digits, got {len}")]
    PhoneTooShort { len: usize, min: usize },
}

/// Failure of [`FormController::save`]: either the operator's input or the store
#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Whether the next save creates a record or overwrites one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Creating,
    Editing(RecordId),
}

/// What a successful save did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(MeasurementRecord),
    Updated(MeasurementRecord),
}

impl SaveOutcome {
    pub fn record(&self) -> &MeasurementRecord {
        match self {
            SaveOutcome::Created(r) | SaveOutcome::Updated(r) => r,
        }
    }
}

/// A named text input of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
}

/// The measurement form: inputs in on-screen order plus the current mode
#[derive(Debug, Clone)]
pub struct FormController {
    inputs: Vec<FormInput>,
    mode: FormMode,
    /// Clear every input before populating it for an edit
    clear_on_edit: bool,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    /// Creates an empty form in creating mode
    pub fn new() -> Self {
        let mut inputs = vec![
            FormInput {
                name: "name",
                label: "Client Name",
                value: String::new(),
            },
            FormInput {
                name: "phone",
                label: "Phone",
                value: String::new(),
            },
        ];
        inputs.extend(MeasurementField::ALL.iter().map(|f| FormInput {
            name: f.key(),
            label: f.label(),
            value: String::new(),
        }));
        inputs.push(FormInput {
            name: "comments",
            label: "Comments",
            value: String::new(),
        });

        Self {
            inputs,
            mode: FormMode::Creating,
            clear_on_edit: false,
        }
    }

    /// Opt into clearing all inputs when an edit starts, instead of keeping
    /// whatever the inputs held for keys missing on the edited record
    pub fn with_clear_on_edit(mut self, clear_on_edit: bool) -> Self {
        self.clear_on_edit = clear_on_edit;
        self
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn inputs(&self) -> &[FormInput] {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut [FormInput] {
        &mut self.inputs
    }

    /// Current value of a named input
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inputs
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.value.as_str())
    }

    /// Sets a named input; returns false if the form has no such input
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.inputs.iter_mut().find(|i| i.name == name) {
            Some(input) => {
                input.value = value.into();
                true
            }
            None => false,
        }
    }

    /// True if any input holds text
    pub fn is_dirty(&self) -> bool {
        self.inputs.iter().any(|i| !i.value.is_empty())
    }

    /// Empties every input
    pub fn reset(&mut self) {
        for input in &mut self.inputs {
            input.value.clear();
        }
    }

    /// Leaves edit mode without saving
    pub fn cancel_edit(&mut self) {
        self.mode = FormMode::Creating;
        self.reset();
    }

    /// Drops edit mode if `id` is the record being edited, keeping the typed
    /// inputs so the next save creates a new record. Returns true if it did.
    pub fn release_record(&mut self, id: &RecordId) -> bool {
        if self.mode == FormMode::Editing(*id) {
            self.mode = FormMode::Creating;
            true
        } else {
            false
        }
    }

    /// Loads the record shown at `display_index` into the form and switches
    /// to editing it. Returns the record's storage-order index.
    pub fn start_edit<S: KeyValueStorage>(
        &mut self,
        store: &RecordStore<S>,
        display_index: usize,
    ) -> Result<usize> {
        let records = store.load_all()?;
        let len = records.len();
        let storage_index =
            display_to_storage_index(len, display_index).ok_or(StoreError::DisplayIndexOutOfRange {
                index: display_index,
                len,
            })?;
        let record = &records[storage_index];

        if self.clear_on_edit {
            self.reset();
        }
        self.populate(record);
        self.mode = FormMode::Editing(record.id);
        log::debug!(
            "Editing display index {} (storage index {})",
            display_index,
            storage_index
        );
        Ok(storage_index)
    }

    /// Copies every key persisted on `record` into the matching input.
    /// Inputs for keys the record lacks keep their current text.
    fn populate(&mut self, record: &MeasurementRecord) {
        for input in &mut self.inputs {
            if record.has_key(input.name) {
                input.value = record.value_of(input.name).unwrap_or("").to_string();
            }
        }
    }

    /// Checks required fields and the phone length
    pub fn validate(&self) -> Result<(), ValidationError> {
        for field in REQUIRED_FIELDS {
            if self.get(field).unwrap_or("").is_empty() {
                return Err(ValidationError::Required(field));
            }
        }

        let len = self.get("phone").unwrap_or("").chars().count();
        if len < MIN_PHONE_LEN {
            return Err(ValidationError::PhoneTooShort {
                len,
                min: MIN_PHONE_LEN,
            });
        }
        Ok(())
    }

    /// Builds a record from the inputs, stamped with the current local time.
    /// Every input is persisted, blank ones as empty values.
    pub fn to_record(&self) -> MeasurementRecord {
        let mut measurements = Measurements::default();
        for field in MeasurementField::ALL {
            measurements.store_input(field, self.get(field.key()).unwrap_or(""));
        }

        let mut record = MeasurementRecord::new(
            self.get("name").unwrap_or("").to_string(),
            self.get("phone").unwrap_or("").to_string(),
        );
        record.comments = Some(self.get("comments").unwrap_or("").trim_end().to_string());
        record.measurements = measurements;
        record.timestamp = timestamp_now();
        record
    }

    /// Validates and persists the form according to the current mode.
    ///
    /// On validation failure nothing is written and the form is unchanged.
    /// On success the form returns to creating mode with every input empty.
    pub fn save<S: KeyValueStorage>(
        &mut self,
        store: &RecordStore<S>,
    ) -> Result<SaveOutcome, SaveError> {
        self.validate()?;
        let record = self.to_record();

        let outcome = match self.mode {
            FormMode::Editing(id) => {
                store.replace_by_id(&id, record.clone())?;
                SaveOutcome::Updated(MeasurementRecord { id, ..record })
            }
            FormMode::Creating => SaveOutcome::Created(store.append(record)?),
        };

        self.mode = FormMode::Creating;
        self.reset();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn abc_store() -> RecordStore<MemoryStorage> {
        let store = RecordStore::new(MemoryStorage::new());
        for name in ["A", "B", "C"] {
            let mut r = MeasurementRecord::new(name.to_string(), "08012345678".to_string());
            r.measurements
                .set(MeasurementField::Waist, Some(format!("{}-waist", name)));
            store.append(r).unwrap();
        }
        store
    }

    fn filled_form(name: &str, phone: &str) -> FormController {
        let mut form = FormController::new();
        form.set("name", name);
        form.set("phone", phone);
        form
    }

    #[test]
    fn test_form_has_all_inputs() {
        let mut form = FormController::new();
        assert_eq!(form.inputs().len(), 26);
        assert_eq!(form.mode(), FormMode::Creating);
        assert!(!form.is_dirty());
        assert!(!form.set("bogus", "x"));
        assert!(form.set("head", "22"));
        assert!(form.is_dirty());
    }

    #[test]
    fn test_missing_name_is_rejected_without_writing() {
        let store = abc_store();
        let before = store.load_all().unwrap();
        let mut form = filled_form("", "08012345678");

        let err = form.save(&store).unwrap_err();
        assert!(matches!(
            err,
            SaveError::Validation(ValidationError::Required("name"))
        ));
        assert_eq!(err.to_string(), "name is required");
        assert_eq!(store.load_all().unwrap(), before);
        assert_eq!(form.get("phone"), Some("08012345678"));
    }

    #[test]
    fn test_missing_phone_is_rejected() {
        let mut form = filled_form("Ada", "");
        assert_eq!(form.validate(), Err(ValidationError::Required("phone")));
        let store = RecordStore::new(MemoryStorage::new());
        assert!(form.save(&store).is_err());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_short_phone_is_rejected() {
        let store = abc_store();
        let mut form = filled_form("Ada", "0801234567");

        let err = form.save(&store).unwrap_err();
        assert!(err.to_string().starts_with("phone too short"));
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_create_appends_and_resets() {
        let store = abc_store();
        let mut form = filled_form("Dayo", "08099999999");
        form.set("hip", "42");
        form.set("comments", "");

        let outcome = form.save(&store).unwrap();
        assert!(matches!(outcome, SaveOutcome::Created(_)));
        assert!(!outcome.record().timestamp.is_empty());

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].name, "Dayo");
        assert_eq!(records[3].measurements.get(MeasurementField::Hip), Some("42"));
        assert_eq!(records[3].comments(), None);
        assert!(records[3].has_key("comments"));
        assert!(records[3].has_key("calf"));
        assert_eq!(records[3].value_of("calf"), None);
        assert!(!form.is_dirty());
    }

    #[test]
    fn test_editing_one_record_after_another_does_not_leak_values() {
        let store = RecordStore::new(MemoryStorage::new());
        let mut form = filled_form("A", "08011111111");
        form.set("chest", "38");
        form.set("comments", "slim");
        form.save(&store).unwrap();
        let mut form = filled_form("B", "08022222222");
        form.save(&store).unwrap();

        // Display 1 is A, display 0 is B
        form.start_edit(&store, 1).unwrap();
        assert_eq!(form.get("chest"), Some("38"));
        form.start_edit(&store, 0).unwrap();
        assert_eq!(form.get("name"), Some("B"));
        assert_eq!(form.get("chest"), Some(""));
        assert_eq!(form.get("comments"), Some(""));
        form.save(&store).unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records[0].value_of("chest"), Some("38"));
        assert_eq!(records[1].name, "B");
        assert_eq!(records[1].value_of("chest"), None);
        assert_eq!(records[1].comments(), None);
    }

    #[test]
    fn test_edit_display_zero_overwrites_last_storage_slot() {
        let store = abc_store();
        let before = store.load_all().unwrap();
        let mut form = FormController::new();

        assert_eq!(form.start_edit(&store, 0).unwrap(), 2);
        assert_eq!(form.mode(), FormMode::Editing(before[2].id));
        assert_eq!(form.get("name"), Some("C"));
        assert_eq!(form.get("waist"), Some("C-waist"));

        form.set("name", "C-modified");
        let outcome = form.save(&store).unwrap();
        assert!(matches!(outcome, SaveOutcome::Updated(_)));
        assert_eq!(form.mode(), FormMode::Creating);

        let after = store.load_all().unwrap();
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2].name, "C-modified");
        assert_eq!(after[2].id, before[2].id);
    }

    #[test]
    fn test_edit_keeps_inputs_for_keys_missing_on_record() {
        let store = abc_store();
        let mut form = FormController::new();
        form.set("calf", "stale");

        form.start_edit(&store, 1).unwrap();
        assert_eq!(form.get("name"), Some("B"));
        assert_eq!(form.get("calf"), Some("stale"));
    }

    #[test]
    fn test_clear_on_edit_drops_stale_inputs() {
        let store = abc_store();
        let mut form = FormController::new().with_clear_on_edit(true);
        form.set("calf", "stale");

        form.start_edit(&store, 1).unwrap();
        assert_eq!(form.get("calf"), Some(""));
    }

    #[test]
    fn test_start_edit_out_of_range() {
        let store = abc_store();
        let mut form = FormController::new();
        assert!(form.start_edit(&store, 7).is_err());
        assert_eq!(form.mode(), FormMode::Creating);
    }

    #[test]
    fn test_cancel_edit() {
        let store = abc_store();
        let mut form = FormController::new();
        form.start_edit(&store, 0).unwrap();
        form.cancel_edit();
        assert_eq!(form.mode(), FormMode::Creating);
        assert!(!form.is_dirty());
    }
}
