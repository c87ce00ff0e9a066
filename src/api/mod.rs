pub mod dispatch;
pub mod server;
