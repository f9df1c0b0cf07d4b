pub mod busy;
pub mod error;
pub mod request_seq;
pub mod validation;
