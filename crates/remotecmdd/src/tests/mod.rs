//! Test suites for the remote command daemon.

mod support;
mod unit;
