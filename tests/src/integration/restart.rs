//! # Restart Round-Trip
//!
//! Queue state written through the persistence worker survives a power
//! cycle: a new service over the same NVRAM file restores every FIFO entry
//! in order and every latched bit. The pending read does not survive.

#[cfg(test)]
mod tests {
    use crate::fixtures::{bill, code, UnreliableStore};
    use sas_exceptions::{
        ExceptionCode, ExceptionError, ExceptionPollResponder, ExceptionQueueConfigBuilder,
        ExceptionQueueStore, ExceptionReporter, ExceptionService, FileBackedKVStore,
        KvExceptionQueueStore, StoreError,
    };
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn file_service(path: &Path) -> ExceptionService {
        egm_telemetry::init_test_logging();
        let kv = FileBackedKVStore::open(path).unwrap();
        ExceptionService::new(Arc::new(KvExceptionQueueStore::new(kv)))
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exceptions.db");
        let config = ExceptionQueueConfigBuilder::new(1)
            .validation(true)
            .build()
            .unwrap();

        let before = {
            let service = file_service(&path);
            let queue = service.attach_client(config.clone()).unwrap();
            for n in [5, 3, 8] {
                service.broker().report(bill(n));
            }
            service.broker().report(code(ExceptionCode::CashOutTicketPrinted));
            service.broker().report(code(ExceptionCode::SystemValidationRequest));

            // Leave a read outstanding across the power cycle.
            assert_eq!(queue.get_next().code(), ExceptionCode::SystemValidationRequest);

            let snapshot = queue.snapshot();
            service.shutdown().await.unwrap();
            snapshot
        };

        let service = file_service(&path);
        let queue = service.attach_client(config).unwrap();
        let after = queue.snapshot();

        assert_eq!(after.fifo, before.fifo);
        assert_eq!(after.priority_flags, before.priority_flags);
        assert_eq!(after.pending, None);

        // The unacknowledged read is delivered again.
        assert_eq!(queue.get_next().code(), ExceptionCode::SystemValidationRequest);
        queue.acknowledge();
        assert_eq!(queue.get_next().code(), ExceptionCode::CashOutTicketPrinted);
        queue.acknowledge();
        assert_eq!(queue.get_next(), bill(5));
    }

    #[tokio::test]
    async fn test_each_client_restores_own_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exceptions.db");

        {
            let service = file_service(&path);
            let q0 = service
                .attach_client(ExceptionQueueConfigBuilder::new(0).build().unwrap())
                .unwrap();
            let q1 = service
                .attach_client(ExceptionQueueConfigBuilder::new(1).build().unwrap())
                .unwrap();
            service.broker().report_to_client(bill(0), 0);
            service.broker().report_to_client(bill(1), 1);
            service.broker().report_to_client(bill(11), 1);
            assert_eq!((q0.len(), q1.len()), (1, 2));
            service.shutdown().await.unwrap();
        }

        let service = file_service(&path);
        let rows = service.store().load_all().unwrap();
        assert_eq!(rows.iter().map(|r| r.client_id).collect::<Vec<_>>(), vec![0, 1]);

        let q1 = service
            .attach_client(ExceptionQueueConfigBuilder::new(1).build().unwrap())
            .unwrap();
        assert_eq!(q1.get_next(), bill(1));
    }

    #[tokio::test]
    async fn test_failed_writes_do_not_break_polling() {
        egm_telemetry::init_test_logging();
        let store = Arc::new(UnreliableStore::default());
        let service = ExceptionService::new(store.clone());
        let queue = service
            .attach_client(ExceptionQueueConfigBuilder::new(0).build().unwrap())
            .unwrap();

        store.set_failing(true);
        service.broker().report(bill(1));
        assert!(matches!(
            service.flush().await,
            Err(ExceptionError::Storage(StoreError::IOError { .. }))
        ));

        // Polls are still answered from memory.
        assert_eq!(queue.peek(), bill(1));
        assert_eq!(store.load(0).unwrap(), None);

        // Next mutation retries and catches up.
        store.set_failing(false);
        service.broker().report(bill(2));
        service.flush().await.unwrap();

        let row = store.load(0).unwrap().unwrap();
        let restored = sas_exceptions::ExceptionQueueState::restore(&Default::default(), &row)
            .unwrap();
        assert_eq!(restored.len(), 2);
    }
}
