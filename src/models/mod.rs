mod availability;
mod meeting;
mod notification;
mod suggestion;
mod user;

pub use availability::*;
pub use meeting::*;
pub use notification::*;
pub use suggestion::*;
pub use user::*;
