pub mod health;
pub mod logs;
pub mod realtime;
pub mod session;
pub mod sheets;
pub mod stats;
