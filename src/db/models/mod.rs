mod report;
mod sample;
mod session;

pub use report::SleepReport;
pub use sample::Sample;
pub use session::Session;
