pub mod auth;
pub mod counts;
pub mod documents;
pub mod rbac;
pub mod register;
pub mod returns;
pub mod transfers;
