//! Domain types for Tripwire
//!
//! - `circuit`: namespace identity, persisted record and derived state
//! - `common`: timestamps shared by the store and the breaker

mod circuit;
mod common;

// Re-export all public types
pub use circuit::{CircuitRecord, CircuitState, Namespace};
pub use common::Timestamp;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ordering() {
        let t1 = Timestamp::now();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let t2 = Timestamp::now();
        assert!(t2 > t1);
    }

    #[test]
    fn test_fresh_record_is_closed() {
        let record = CircuitRecord::new(Namespace::default());
        assert_eq!(record.state_at(Timestamp::now()), CircuitState::Closed);
    }
}
