pub mod intake;
pub mod scheduling;
