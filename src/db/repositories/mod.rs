mod reports;
mod samples;
mod sessions;
