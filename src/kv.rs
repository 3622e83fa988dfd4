pub mod kv_pair;
