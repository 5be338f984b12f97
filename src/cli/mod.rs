pub mod asc;
pub mod command;
pub mod pce;
pub mod scan;
