pub mod oracle_query_adapter;
