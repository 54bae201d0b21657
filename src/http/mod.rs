//! Plain HTTP access to the deployed test app
//!
//! Used to probe the ingress and to generate load.

mod client;

pub use client::{HttpClient, HttpError, HttpProbe};
