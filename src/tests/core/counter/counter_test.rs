#[cfg(test)]
mod tests {
    use crate::core::counter::{Counter, CounterError, CounterState, Operation, Outcome};

    #[test]
    fn test_increment() {
        let mut counter = Counter::new("test", 0);
        assert_eq!(counter.increment().unwrap(), CounterState { counter: 1 });
        assert_eq!(counter.value(), 1);

        counter.increment().unwrap();
        assert_eq!(counter.value(), 2);
    }

    #[test]
    fn test_new() {
        let counter = Counter::new("test", 42);
        assert_eq!(counter.name(), "test");
        assert_eq!(counter.value(), 42);
        assert_eq!(counter.to_state(), CounterState { counter: 42 });
    }

    #[test]
    fn test_reset_from_any_value() {
        for start in [0, 1, 17, -5, i64::MAX] {
            let mut counter = Counter::new("test", start);
            assert_eq!(counter.reset(), CounterState { counter: 0 });
            assert_eq!(counter.value(), 0);
        }
    }

    #[test]
    fn test_increment_overflow_keeps_value() {
        let mut counter = Counter::new("test", i64::MAX);
        match counter.increment() {
            Err(CounterError::Overflow { name }) => assert_eq!(name, "test"),
            other => panic!("expected overflow, got {other:?}"),
        }
        assert_eq!(counter.value(), i64::MAX);
    }

    #[test]
    fn test_add() {
        assert_eq!(Counter::add(20, 3).unwrap(), 23);
        assert_eq!(Counter::add(3, 20).unwrap(), 23);
        assert_eq!(Counter::add(-7, 7).unwrap(), 0);
        assert!(matches!(
            Counter::add(i64::MAX, 1),
            Err(CounterError::SumOverflow { a: i64::MAX, b: 1 })
        ));
    }

    #[test]
    fn test_state_json_shape() {
        let state = CounterState { counter: 3 };
        assert_eq!(state.to_bytes().unwrap(), br#"{"counter":3}"#.to_vec());
        assert_eq!(CounterState::from_bytes(br#"{"counter":-9}"#).unwrap(), CounterState { counter: -9 });
        assert!(CounterState::from_bytes(b"not json").is_err());
    }

    #[test]
    fn test_outcome_serialization() {
        let state = serde_json::to_string(&Outcome::State(CounterState { counter: 2 })).unwrap();
        assert_eq!(state, r#"{"counter":2}"#);
        assert_eq!(serde_json::to_string(&Outcome::Sum(23)).unwrap(), "23");
    }

    #[test]
    fn test_only_increment_and_reset_mutate() {
        assert!(Operation::Increment.is_mutation());
        assert!(Operation::Reset.is_mutation());
        assert!(!Operation::Read.is_mutation());
        assert!(!Operation::Add { a: 1, b: 2 }.is_mutation());
    }
}
