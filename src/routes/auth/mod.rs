mod login;
mod logout;
mod me;
mod password;
mod register;

pub use login::*;
pub use logout::*;
pub use me::*;
pub use password::change_password;
pub use register::*;
