//! # Poll / Acknowledge Cycle
//!
//! Producer reports through the broker, the poll responder drains the queue
//! the way the long-poll loop does.

#[cfg(test)]
mod tests {
    use crate::fixtures::{bill, code, memory_service, AckCounter};
    use rand::seq::SliceRandom;
    use sas_exceptions::{
        ExceptionCode, ExceptionPollResponder, ExceptionQueueConfigBuilder, ExceptionReporter,
        PendingRead, CANONICAL_PRIORITY_ORDER, MAX_NORMAL_EXCEPTIONS,
    };

    #[tokio::test]
    async fn test_twenty_sixth_exception_dropped_when_discarding_newest() {
        let (service, _store) = memory_service();
        let queue = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).build().unwrap())
            .unwrap();

        for n in 1..=26 {
            service.broker().report(bill(n));
        }

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.fifo.len(), MAX_NORMAL_EXCEPTIONS);
        assert_eq!(snapshot.latched, vec![ExceptionCode::ExceptionBufferOverflow]);

        // Overflow first, then E1..E25 in order.
        assert_eq!(queue.get_next().code(), ExceptionCode::ExceptionBufferOverflow);
        queue.acknowledge();
        for n in 1..=25 {
            assert_eq!(queue.get_next(), bill(n));
            queue.acknowledge();
        }
        assert!(queue.get_next().is_no_activity());
    }

    #[tokio::test]
    async fn test_priority_reported_twice_latches_once() {
        let (service, _store) = memory_service();
        let queue = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).aft(true).build().unwrap())
            .unwrap();
        let acks = AckCounter::default();
        service
            .broker()
            .on_ack(ExceptionCode::AftTransferComplete, acks.callback());

        service.broker().report(code(ExceptionCode::AftTransferComplete));
        service.broker().report(code(ExceptionCode::AftTransferComplete));
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.snapshot().latched.len(), 1);

        assert_eq!(queue.get_next().code(), ExceptionCode::AftTransferComplete);
        queue.acknowledge();
        assert!(queue.is_empty());
        assert_eq!(acks.count(), 1);

        service.broker().report(code(ExceptionCode::AftTransferComplete));
        assert_eq!(queue.peek().code(), ExceptionCode::AftTransferComplete);
        queue.get_next();
        queue.acknowledge();
        // The handler was one-shot.
        assert_eq!(acks.count(), 1);
    }

    #[tokio::test]
    async fn test_second_read_finalizes_only_second_item() {
        let (service, _store) = memory_service();
        let queue = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).validation(true).build().unwrap())
            .unwrap();

        service.broker().report(bill(1));
        assert_eq!(queue.get_next(), bill(1));

        service.broker().report(code(ExceptionCode::TicketHasBeenInserted));
        assert_eq!(queue.get_next().code(), ExceptionCode::TicketHasBeenInserted);
        assert_eq!(
            queue.pending(),
            Some(PendingRead::Priority(ExceptionCode::TicketHasBeenInserted))
        );

        queue.acknowledge();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek(), bill(1));
    }

    #[tokio::test]
    async fn test_peek_does_not_disturb_handshake() {
        let (service, _store) = memory_service();
        let queue = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).build().unwrap())
            .unwrap();
        service.broker().report(bill(1));
        service.broker().report(bill(2));

        let read = queue.get_next();
        for _ in 0..3 {
            assert_eq!(queue.peek(), bill(1));
        }
        assert_eq!(queue.pending(), Some(PendingRead::NormalHead(read)));

        queue.acknowledge();
        assert_eq!(queue.peek(), bill(2));
    }

    #[tokio::test]
    async fn test_priority_drain_order_independent_of_report_order() {
        let (service, _store) = memory_service();
        let queue = service
            .attach_client(
                ExceptionQueueConfigBuilder::new(0)
                    .aft(true)
                    .validation(true)
                    .general_control(true)
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let mut shuffled = CANONICAL_PRIORITY_ORDER.to_vec();
        shuffled.shuffle(&mut rand::thread_rng());
        for c in &shuffled {
            service.broker().report(code(*c));
        }
        service.broker().report(bill(9));

        let mut drained = Vec::new();
        loop {
            let next = queue.get_next();
            if next.is_no_activity() {
                break;
            }
            drained.push(next.code());
            queue.acknowledge();
        }

        let mut expected = CANONICAL_PRIORITY_ORDER.to_vec();
        expected.push(ExceptionCode::BillAccepted);
        assert_eq!(drained, expected);
    }

    #[tokio::test]
    async fn test_handpay_retracted_before_poll() {
        let (service, _store) = memory_service();
        let queue = service
            .attach_client(
                ExceptionQueueConfigBuilder::new(0)
                    .general_control(true)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let acks = AckCounter::default();
        service
            .broker()
            .on_ack(ExceptionCode::HandpayIsPending, acks.callback());

        service.broker().report(code(ExceptionCode::HandpayIsPending));
        service.broker().retract(&code(ExceptionCode::HandpayIsPending));

        assert!(queue.get_next().is_no_activity());
        queue.acknowledge();
        assert_eq!(acks.count(), 0);
        assert!(!service
            .broker()
            .has_ack_handler(ExceptionCode::HandpayIsPending));
    }
}
