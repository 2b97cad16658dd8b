pub mod credentials;
pub mod message;

pub use credentials::{PageCredential, WhatsappCredential};
pub use message::{Direction, MessageRecord, Platform};
