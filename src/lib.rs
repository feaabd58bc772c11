//! blogforge — a blog-publishing backend.
//!
//! The design core is the authentication subsystem: stateless signed access
//! tokens, server-stored opaque refresh tokens delivered via HttpOnly
//! cookies, and a per-request identity filter that downstream authorization
//! guards consult. Blog and user profile handling ride on top as
//! persistence-backed request handlers.

pub mod core;
