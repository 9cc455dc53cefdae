pub mod app;
pub mod cmd;
pub mod fx;
pub mod log;
pub mod statement;
pub mod tax;
pub mod tracing;
pub mod util;

extern crate lazy_static;

#[cfg(any(test, feature = "testlib"))]
pub mod testlib;
