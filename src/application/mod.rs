pub mod orchestrator;
pub mod report;
pub mod row_sink;
pub mod row_source;
