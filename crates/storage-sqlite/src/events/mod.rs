mod model;
mod repository;

pub use model::{EventAttendeeDB, EventDB, NewEventAttendeeDB};
pub use repository::{EventAttendeeRepository, EventRepository};
