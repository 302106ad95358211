mod command;
mod runner;

pub use command::{Command, FindBy, ReportKind};
pub use runner::{OutputMode, Section, render, run};
