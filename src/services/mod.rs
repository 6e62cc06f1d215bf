pub mod booking;
pub mod mail;
pub mod notify;
pub mod payment_flow;
pub mod payments;
pub mod slots;
