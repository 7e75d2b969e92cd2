pub mod auth;
pub mod call;
pub mod output;
