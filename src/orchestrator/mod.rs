//! Query orchestration: concurrent fetch plus the result pipeline.

pub mod aggregate;
pub mod dedup;
pub mod fanout;
pub mod normalize;
pub mod scoring;
