pub mod single_flight;

pub use single_flight::panic_message;
pub use single_flight::FlightError;
pub use single_flight::SingleFlight;
