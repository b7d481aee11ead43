pub mod contact;
pub mod tryon;
