pub mod gcs_storage_adapter;
