mod common;
mod stats;
