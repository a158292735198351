pub mod export;
pub mod form;
pub mod models;
pub mod render;
pub mod search;
pub mod session;
pub mod settings;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use export::{export_records, export_to_file, ExportFormat};
pub use form::{FormController, FormInput, FormMode, SaveError, SaveOutcome, ValidationError};
pub use models::{
    timestamp_now, MeasurementField, MeasurementRecord, Measurements, RecordId, MIN_PHONE_LEN,
    NOT_AVAILABLE,
};
pub use render::{
    display_order, format_card, format_summary_line, render, Card, DetailRow, RenderedList,
};
pub use search::SearchFilter;
pub use session::Session;
pub use settings::{determine_data_path, get_settings_path, Settings};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{display_to_storage_index, RecordStore, StoreError, STORAGE_KEY};
