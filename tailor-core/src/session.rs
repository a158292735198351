//! Session
//!
//! Runs the page control flow for a front-end: the form produces a record,
//! the store persists it, the list is re-rendered and the current search
//! filter is re-applied to the fresh cards.

use anyhow::Result;

use crate::form::{FormController, SaveError, SaveOutcome};
use crate::models::MeasurementRecord;
use crate::render::{display_order, render, RenderedList};
use crate::search::SearchFilter;
use crate::storage::KeyValueStorage;
use crate::store::RecordStore;

/// State shared by one operator's view of the record collection
pub struct Session<S: KeyValueStorage> {
    store: RecordStore<S>,
    pub form: FormController,
    list: RenderedList,
    filter: SearchFilter,
    /// Display index the view should scroll to, if any
    scroll_target: Option<usize>,
}

impl<S: KeyValueStorage> Session<S> {
    /// Opens a session and renders the stored records
    pub fn open(store: RecordStore<S>, form: FormController) -> Result<Self> {
        let mut session = Self {
            store,
            form,
            list: RenderedList::default(),
            filter: SearchFilter::new(),
            scroll_target: None,
        };
        session.reload()?;
        Ok(session)
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    /// Cards from the latest render, with the filter applied
    pub fn cards(&self) -> &RenderedList {
        &self.list
    }

    pub fn query(&self) -> &str {
        self.filter.query()
    }

    /// Takes the pending scroll request, if any
    pub fn take_scroll_target(&mut self) -> Option<usize> {
        self.scroll_target.take()
    }

    /// Reloads the collection, re-renders every card and re-applies the filter
    pub fn reload(&mut self) -> Result<()> {
        let records = self.store.load_all()?;
        self.list = render(&display_order(&records));
        self.filter.apply(&mut self.list);
        Ok(())
    }

    /// Updates the search query; returns the first match to scroll to
    pub fn set_query(&mut self, query: &str) -> Option<usize> {
        let first = self.filter.set_query(query, &mut self.list);
        self.scroll_target = first;
        first
    }

    /// Saves the form and refreshes the list on success
    pub fn save(&mut self) -> Result<SaveOutcome, SaveError> {
        let outcome = self.form.save(&self.store)?;
        self.reload()?;
        Ok(outcome)
    }

    /// Loads the card at `display_index` into the form for editing
    pub fn start_edit(&mut self, display_index: usize) -> Result<()> {
        self.form.start_edit(&self.store, display_index)?;
        Ok(())
    }

    /// Deletes the card at `display_index` and refreshes the list.
    ///
    /// Deleting the record under edit returns the form to creating mode
    /// with its inputs intact.
    pub fn delete(&mut self, display_index: usize) -> Result<MeasurementRecord> {
        let removed = self.store.remove_at(display_index)?;
        if self.form.release_record(&removed.id) {
            log::info!("Record {} was deleted while being edited", removed.id);
        }
        self.reload()?;
        Ok(removed)
    }
}
