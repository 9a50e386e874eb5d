//! # Multi-Client Delivery
//!
//! Two host clients with different subscriptions on one broker.

#[cfg(test)]
mod tests {
    use crate::fixtures::{bill, code, memory_service, AckCounter};
    use egm_telemetry::log_client_event;
    use sas_exceptions::{
        DeliveryGroup, ExceptionCode, ExceptionPayload, ExceptionPollResponder,
        ExceptionQueueConfigBuilder, ExceptionReporter,
    };

    #[tokio::test]
    async fn test_group_fan_out() {
        let (service, _store) = memory_service();
        let accounting = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).build().unwrap())
            .unwrap();
        let cashless = service
            .attach_client(
                ExceptionQueueConfigBuilder::new(1)
                    .aft(true)
                    .game_start_end(true)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        log_client_event!(debug, "egm-tests", "Clients attached", 1u8, groups = ?cashless.subscribed_groups());

        service.broker().report(code(ExceptionCode::SlotDoorOpened));
        service.broker().report(code(ExceptionCode::AftTransferComplete));
        service
            .broker()
            .report(ExceptionPayload::new(ExceptionCode::GameStarted, [0x00, 0x10]));

        assert_eq!(accounting.snapshot().fifo, vec![ExceptionCode::SlotDoorOpened]);
        assert!(accounting.snapshot().latched.is_empty());

        let snapshot = cashless.snapshot();
        assert_eq!(
            snapshot.fifo,
            vec![ExceptionCode::SlotDoorOpened, ExceptionCode::GameStarted]
        );
        assert_eq!(snapshot.latched, vec![ExceptionCode::AftTransferComplete]);

        let stats = service.broker().stats();
        assert_eq!((stats.reported, stats.delivered, stats.dropped), (3, 4, 0));
    }

    #[tokio::test]
    async fn test_client_targeted_delivery() {
        let (service, _store) = memory_service();
        let a = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).build().unwrap())
            .unwrap();
        let b = service
            .attach_client(ExceptionQueueConfigBuilder::new(1).build().unwrap())
            .unwrap();

        service.broker().report_to_client(bill(1), 1);
        service.broker().retract_from_client(&bill(1), 0);

        assert!(a.is_empty());
        assert_eq!(b.get_next(), bill(1));
    }

    #[tokio::test]
    async fn test_provider_builds_client_specific_payload() {
        let (service, _store) = memory_service();
        let queues: Vec<_> = (0..2)
            .map(|id| {
                service
                    .attach_client(ExceptionQueueConfigBuilder::new(id).aft(true).build().unwrap())
                    .unwrap()
            })
            .collect();

        service
            .broker()
            .report_with(ExceptionCode::AftRequestToRegister, |client_id| {
                ExceptionPayload::new(ExceptionCode::AftRequestToRegister, [client_id])
            });

        for queue in &queues {
            assert_eq!(queue.get_next().code(), ExceptionCode::AftRequestToRegister);
        }
        assert_eq!(service.broker().stats().delivered, 2);
    }

    #[tokio::test]
    async fn test_ack_on_either_client_fires_shared_handler_once() {
        let (service, _store) = memory_service();
        let a = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).validation(true).build().unwrap())
            .unwrap();
        let b = service
            .attach_client(ExceptionQueueConfigBuilder::new(1).validation(true).build().unwrap())
            .unwrap();
        let acks = AckCounter::default();
        service
            .broker()
            .on_ack(ExceptionCode::TicketTransferComplete, acks.callback());

        service.broker().report(code(ExceptionCode::TicketTransferComplete));
        b.get_next();
        b.acknowledge();
        a.get_next();
        a.acknowledge();

        assert_eq!(acks.count(), 1);
        assert!(a.is_empty() && b.is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_client_stops_receiving() {
        let (service, _store) = memory_service();
        let a = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).build().unwrap())
            .unwrap();
        let b = service
            .attach_client(ExceptionQueueConfigBuilder::new(1).build().unwrap())
            .unwrap();

        drop(b);
        assert_eq!(service.broker().subscriber_count(DeliveryGroup::General), 1);

        service.broker().report(bill(3));
        assert_eq!(a.len(), 1);
        assert!(service.client(1).is_none());
    }

    #[tokio::test]
    async fn test_concurrent_reporters() {
        let (service, _store) = memory_service();
        let queue = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).aft(true).build().unwrap())
            .unwrap();
        let broker = service.broker().clone();

        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let broker = broker.clone();
                std::thread::spawn(move || {
                    for n in 0..5u8 {
                        broker.report(bill(t * 10 + n));
                        broker.report(code(ExceptionCode::GameLocked));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 20);
        assert_eq!(queue.snapshot().latched, vec![ExceptionCode::GameLocked]);
        service.flush().await.unwrap();
    }
}
