mod broker;
mod login;

pub use broker::Broker;
pub use login::{LoginAttempt, begin_login, complete_login};
