//! Concurrent passes and cancellation.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::join_all;
    use sitecfg_engine::{ErrorKind, PlanAction};
    use sitecfg_model::{DesiredConfiguration, RedirectAllRequestsTo, WebsiteConfiguration};

    use crate::{create_test_bucket, harness};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_reconcile_different_identifiers_concurrently() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let buckets: Vec<String> = (0..16)
            .map(|i| create_test_bucket(&service, &format!("par{i}")))
            .collect();

        let passes = buckets.iter().map(|bucket| {
            let controller = controller.clone();
            let desired = DesiredConfiguration::new(bucket).with_index_document("index.html");
            tokio::spawn(async move { controller.reconcile(None, Some(&desired)).await })
        });

        for result in join_all(passes).await {
            let plan = result??;
            assert_eq!(plan.action, PlanAction::Create);
        }
        for bucket in &buckets {
            assert!(service.stored_document(bucket).is_some(), "{bucket}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_should_detect_racing_writer_on_same_identifier() {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "race");
        service.race_next_put(WebsiteConfiguration {
            redirect_all_requests_to: Some(RedirectAllRequestsTo {
                host_name: "other-writer.example.com".to_owned(),
                protocol: None,
            }),
            ..WebsiteConfiguration::default()
        });

        let err = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await
            .expect_err("racing writer");
        assert!(matches!(err.kind, ErrorKind::DriftAfterApply(_)), "{err}");
    }

    #[tokio::test]
    async fn test_should_leave_no_state_when_cancelled() {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "cancel");
        service.set_latency(Some(Duration::from_millis(200)));

        let desired = DesiredConfiguration::new(&bucket).with_index_document("index.html");
        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), controller.create(&desired)).await;
        assert!(cancelled.is_err(), "pass should have been cancelled");

        service.set_latency(None);
        assert!(service.stored_document(&bucket).is_none());
        assert!(controller.create(&desired).await.is_ok());
    }
}
