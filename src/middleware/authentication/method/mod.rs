mod f_cookie;

pub use f_cookie::try_cookie;
