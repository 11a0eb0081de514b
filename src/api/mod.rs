pub mod attendance;
pub mod classroom;
pub mod image;
pub mod request;
pub mod slide;
