#[cfg(test)]
mod tests {
    use ladle::{AsValue, Interval, Value};
    use std::time::Duration;

    #[test]
    fn interval_constructors() {
        let interval = Interval::new(14, 2, 3_500_000_000);
        assert_eq!(interval.months(), 14);
        assert_eq!(interval.days(), 2);
        assert_eq!(interval.nanos(), 3_500_000_000);
        assert!(!interval.is_zero());
        assert!(Interval::default().is_zero());
        assert_eq!(Interval::from_secs(90).nanos(), 90 * Interval::NANOS_IN_SEC);
        assert_eq!(Interval::from_days(3).days(), 3);
    }

    #[test]
    fn interval_normalizes_for_equality() {
        assert_eq!(
            Interval::new(0, 1, 0),
            Interval::from_nanos(Interval::NANOS_IN_DAY)
        );
        assert_ne!(Interval::new(1, 0, 0), Interval::from_days(30));
    }

    #[test]
    fn interval_from_duration_round_trips() {
        let duration = Duration::new(7200, 250);
        let interval = Interval::from_duration(&duration);
        assert_eq!(interval.as_duration(Interval::DAYS_IN_MONTH), duration);
        let value = duration.as_value();
        assert!(matches!(value, Value::Interval(Some(..))));
        let back: Duration = AsValue::try_from_value(value).unwrap();
        assert_eq!(back, duration);
    }
}
