//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod credentials; // pages, whatsapp
mod messages;    // messages
