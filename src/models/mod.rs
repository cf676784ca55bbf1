mod subscription;
mod tier;
mod user;

pub use subscription::*;
pub use tier::*;
pub use user::*;
