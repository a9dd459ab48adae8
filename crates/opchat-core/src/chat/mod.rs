//! Chat domain: session store, message log, and broadcast fanout.

pub mod bus;
pub mod repository;
pub mod service;
