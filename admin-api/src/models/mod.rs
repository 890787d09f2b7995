mod admin;
mod audit_log;
mod category;
mod stream_stat;
mod user;

pub use admin::*;
pub use audit_log::*;
pub use category::*;
pub use stream_stat::*;
pub use user::*;
