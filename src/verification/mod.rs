pub mod comparator;
pub mod expectations;
pub mod golden;
pub mod report;
pub mod session;
