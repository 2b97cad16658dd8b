pub mod health;
pub mod messages;
pub mod oauth;
pub mod webhook;
pub mod whatsapp;
