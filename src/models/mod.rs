pub mod consult;
pub mod health;
pub mod message;
pub mod reply;
pub mod retry;
pub mod withdrawal;
