pub mod booking;
pub mod payment;
pub mod service_duration;
pub mod settings;
pub mod working_hours;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use payment::{Payment, PaymentMethod, PaymentRecordStatus};
pub use service_duration::ServiceDuration;
pub use settings::ClinicSettings;
pub use working_hours::WorkingHour;
