pub mod attendance;
pub mod image;
pub mod request;
pub mod role;
pub mod slide;
pub mod user;
