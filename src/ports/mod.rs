pub mod query_port;
pub mod storage_port;
