pub mod monitor;
pub mod run;
