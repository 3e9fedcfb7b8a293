//! End-to-end scan scenarios driven by a scripted, in-memory probe.

mod scan;
mod support;
