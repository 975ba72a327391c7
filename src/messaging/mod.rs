//! Direct messages between marketplace members

mod contacts;
mod model;
mod service;

pub use contacts::{contact_filter_for, ContactFilter};
pub use model::*;
pub use service::MessageService;
