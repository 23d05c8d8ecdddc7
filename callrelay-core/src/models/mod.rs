pub mod board;
pub mod contact;
