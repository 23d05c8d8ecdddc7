pub mod dashboard;
pub mod webhook;
