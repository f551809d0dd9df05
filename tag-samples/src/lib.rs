//! Shared plumbing for the sample reader clients
//!
//! Every binary in `src/bin/` accepts the same invocation shape and
//! runs the same connect sequence; the [`cli`] module holds that shared
//! surface so the samples stay focused on what they each demonstrate.

pub mod cli;
