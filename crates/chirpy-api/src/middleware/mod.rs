//! Request middleware that is not tied to authentication

pub mod hits;

pub use hits::fileserver_hits_middleware;
