#[cfg(test)]
mod tests {
    use futures::{StreamExt, stream};
    use ladle::{
        CancelSignature, CancelToken, Cancelled, DbError, Error, QueryResult, Result, RowsAffected,
        cancel_checked, reclassify,
    };
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    const SIGNATURE: CancelSignature = CancelSignature {
        severity: 11,
        code: 0,
        state: 0,
    };

    fn abort_error() -> Error {
        Error::new(DbError {
            severity: 11,
            code: 0,
            state: 0,
            message: "interrupted".into(),
        })
    }

    #[test]
    fn token_fires_callbacks_exactly_once() {
        let token = CancelToken::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let _registration = token.register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registration_on_a_cancelled_token_fires_immediately() {
        let token = CancelToken::new();
        token.cancel();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let _registration = token.register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disposed_registrations_never_fire() {
        let token = CancelToken::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut registration = token.register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registration.dispose();
        registration.dispose();
        token.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clones_share_the_cancelled_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn reclassifies_only_matching_errors_on_cancelled_tokens() {
        let token = CancelToken::new();
        token.cancel();
        let error = reclassify(abort_error(), &token, &SIGNATURE);
        assert!(error.downcast_ref::<Cancelled>().is_some());
    }

    #[test]
    fn matching_errors_without_cancellation_are_preserved() {
        let token = CancelToken::new();
        let error = reclassify(abort_error(), &token, &SIGNATURE);
        assert!(error.downcast_ref::<Cancelled>().is_none());
        let db = error.downcast_ref::<DbError>().unwrap();
        assert_eq!(db.message, "interrupted");
    }

    #[test]
    fn non_matching_errors_on_cancelled_tokens_are_preserved() {
        let token = CancelToken::new();
        token.cancel();
        let different = Error::new(DbError {
            severity: 16,
            code: 2627,
            state: 1,
            message: "duplicate key".into(),
        });
        let error = reclassify(different, &token, &SIGNATURE);
        assert!(error.downcast_ref::<Cancelled>().is_none());
        // Errors with no provider diagnostic at all pass through too.
        let plain = reclassify(Error::msg("io failure"), &token, &SIGNATURE);
        assert!(plain.downcast_ref::<Cancelled>().is_none());
        assert_eq!(plain.to_string(), "io failure");
    }

    #[tokio::test]
    async fn cancel_checked_rewrites_the_error_arm_only() {
        let token = CancelToken::new();
        token.cancel();
        let items: Vec<Result<QueryResult>> = vec![
            Ok(QueryResult::Affected(RowsAffected::default())),
            Err(abort_error()),
        ];
        let checked: Vec<_> = cancel_checked(stream::iter(items), token, SIGNATURE)
            .collect()
            .await;
        assert!(checked[0].is_ok());
        assert!(
            checked[1]
                .as_ref()
                .unwrap_err()
                .downcast_ref::<Cancelled>()
                .is_some()
        );
    }
}
