//! Wire-level knowledge about the two faces of a mail catcher: its SMTP listener
//! and its HTTP API. Nothing here opens sockets on its own; callers hand in streams
//! or already-fetched bodies.

pub mod api;
pub mod smtp;
