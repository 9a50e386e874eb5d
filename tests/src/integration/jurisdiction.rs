//! # Jurisdiction Variants
//!
//! Handpay ordering, validation type "none" and the overflow policy, each
//! selected per client session.

#[cfg(test)]
mod tests {
    use crate::fixtures::{bill, code, memory_service};
    use sas_exceptions::{
        ExceptionCode, ExceptionPollResponder, ExceptionQueueConfig, ExceptionQueueConfigBuilder,
        ExceptionReporter, MAX_NORMAL_EXCEPTIONS,
    };

    #[tokio::test]
    async fn test_legacy_handpay_ordering() {
        let (service, _store) = memory_service();
        let config = ExceptionQueueConfig::from_json_str(
            r#"{
                "client_id": 0,
                "jurisdiction": { "legacy_handpay_ordering": true },
                "subscriptions": { "validation": true, "general_control": true }
            }"#,
        )
        .unwrap();
        let queue = service.attach_client(config).unwrap();

        service.broker().report(code(ExceptionCode::HandpayValidated));
        service.broker().report(code(ExceptionCode::HandpayIsPending));

        assert_eq!(queue.get_next().code(), ExceptionCode::HandpayIsPending);
        queue.acknowledge();
        assert_eq!(queue.get_next().code(), ExceptionCode::HandpayValidated);
    }

    #[tokio::test]
    async fn test_none_validation_queues_ticket_printed_in_fifo() {
        let (service, _store) = memory_service();
        let queue = service
            .attach_client(
                ExceptionQueueConfigBuilder::new(0)
                    .none_validation(true)
                    .validation(true)
                    .build()
                    .unwrap(),
            )
            .unwrap();

        service.broker().report(bill(1));
        service.broker().report(code(ExceptionCode::CashOutTicketPrinted));
        service.broker().report(code(ExceptionCode::CashOutTicketPrinted));

        // FIFO order, duplicates kept, no latching.
        let snapshot = queue.snapshot();
        assert_eq!(
            snapshot.fifo,
            vec![
                ExceptionCode::BillAccepted,
                ExceptionCode::CashOutTicketPrinted,
                ExceptionCode::CashOutTicketPrinted
            ]
        );
        assert!(snapshot.latched.is_empty());
        assert_eq!(queue.peek(), bill(1));
    }

    #[tokio::test]
    async fn test_discard_oldest_admits_newest() {
        let (service, _store) = memory_service();
        let queue = service
            .attach_client(
                ExceptionQueueConfigBuilder::new(0)
                    .discard_oldest(true)
                    .build()
                    .unwrap(),
            )
            .unwrap();

        for n in 1..=30 {
            service.broker().report(bill(n));
        }

        assert_eq!(queue.len(), MAX_NORMAL_EXCEPTIONS);
        assert_eq!(queue.get_next().code(), ExceptionCode::ExceptionBufferOverflow);
        queue.acknowledge();
        assert_eq!(queue.get_next(), bill(6));
    }

    #[tokio::test]
    async fn test_switching_validation_type_between_sessions() {
        let (service, _store) = memory_service();
        let standard = ExceptionQueueConfigBuilder::new(0)
            .validation(true)
            .build()
            .unwrap();

        let queue = service.attach_client(standard).unwrap();
        service.broker().report(code(ExceptionCode::HandpayValidated));
        service.broker().report(code(ExceptionCode::TicketTransferComplete));
        queue.dispose();
        drop(queue);
        service.flush().await.unwrap();

        let none = ExceptionQueueConfigBuilder::new(0)
            .validation(true)
            .none_validation(true)
            .build()
            .unwrap();
        let queue = service.attach_client(none).unwrap();
        let snapshot = queue.snapshot();

        assert_eq!(snapshot.latched, vec![ExceptionCode::TicketTransferComplete]);
        assert_eq!(snapshot.fifo, vec![ExceptionCode::HandpayValidated]);
    }
}
