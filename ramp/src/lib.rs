pub mod cfg;
pub mod committee;
pub mod crypto;
pub mod db;
pub mod digest;
pub mod error;
pub mod forwarder;
pub mod host;
pub mod implementation;
pub mod message;
pub mod originator;
pub mod policy;
pub mod proxy;
pub mod state;
pub mod verifier;
