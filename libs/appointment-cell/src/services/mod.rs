pub mod clock;
pub mod ledger;
pub mod lifecycle;
pub mod numbering;
pub mod pricing;
pub mod store;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ledger::BookingLedger;
pub use store::{AppointmentStore, LocalAppointmentStore, MemoryAppointmentStore, SupabaseAppointmentStore};
