pub mod basic;
pub mod date;
pub mod decimal;
pub mod os;
pub mod rw;
