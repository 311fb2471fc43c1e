//! Repository implementations

mod clinics;
mod prescriptions;
mod receipts;
mod visits;

pub use clinics::ClinicRepo;
pub use prescriptions::PrescriptionRepo;
pub use receipts::ReceiptRepo;
pub use visits::VisitRepo;
