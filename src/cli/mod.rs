pub mod args;
pub mod dispatch;
