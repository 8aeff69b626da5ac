pub mod consultation;
pub mod matching;
pub mod models;
pub mod registry;
pub mod triage;

pub use consultation::{render_assessment, suggested_actions, welcome_message};
pub use matching::{
    available_dates, available_dates_from, book, filter, rank, BookingError, ProviderOrder,
    SPECIALIZATIONS,
};
pub use models::*;
pub use registry::RegistryError;
pub use triage::{diagnose, ReportError, SymptomReport, TriageEngine, TriageError, TriageRule};
