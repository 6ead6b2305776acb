//! Database query operations organized by entity

pub mod counters;

// Re-export commonly used query functions
pub use counters::{
    delete_counter, get_counter_record, increment_counter, list_counter_records,
    set_closetime_if_tripped, upsert_counter,
};
