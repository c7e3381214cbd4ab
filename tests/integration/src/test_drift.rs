//! Drift detection and failure classification scenarios.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sitecfg_engine::memory::RemoteCall;
    use sitecfg_engine::{EngineConfig, ErrorKind, PlanAction, RemoteError, WebsiteAttribute};
    use sitecfg_model::{DesiredConfiguration, IndexDocument, WebsiteConfiguration};

    use crate::{create_test_bucket, harness, harness_with};

    #[tokio::test]
    async fn test_should_correct_out_of_band_change() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "drift-oob");

        let desired = DesiredConfiguration::new(&bucket).with_index_document("index.html");
        let id = controller.create(&desired).await?;

        service.set_configuration(
            &bucket,
            &WebsiteConfiguration {
                index_document: Some(IndexDocument {
                    suffix: "home.html".to_owned(),
                }),
                ..WebsiteConfiguration::default()
            },
        )?;

        let plan = controller.reconcile(Some(&id), Some(&desired)).await?;
        assert_eq!(plan.action, PlanAction::Update);
        assert_eq!(plan.changed_attributes(), vec![WebsiteAttribute::IndexDocument]);
        tracing::info!(%plan, "corrected drift");

        let plan = controller.reconcile(Some(&id), Some(&desired)).await?;
        assert!(plan.is_noop());
        Ok(())
    }

    #[tokio::test]
    async fn test_should_report_host_name_normalization_as_drift() {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "drift-host");
        service.lowercase_host_names(true);

        let desired =
            DesiredConfiguration::new(&bucket).with_redirect_all_requests_to("Example.COM", None);
        let err = controller.create(&desired).await.expect_err("drift");

        assert!(matches!(err.kind, ErrorKind::DriftAfterApply(_)), "{err}");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_should_report_incomplete_destroy() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "drift-destroy");

        let id = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await?;
        service.ignore_deletes(true);

        let err = controller.delete(&id).await.expect_err("delete ignored");
        assert_eq!(err.kind, ErrorKind::DestroyIncomplete);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_allow_retry_after_throttling() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "drift-throttle");
        service.fail_next(
            RemoteCall::GetConfiguration,
            RemoteError::service("SlowDown", "Please reduce your request rate."),
        );

        let desired = DesiredConfiguration::new(&bucket).with_index_document("index.html");
        let err = controller.create(&desired).await.expect_err("throttled");
        assert!(err.is_retryable());
        assert_eq!(service.call_count(RemoteCall::PutConfiguration), 0);

        controller.create(&desired).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_should_classify_deadline_as_transient() {
        let config = EngineConfig::builder().operation_timeout_ms(20).build();
        let (service, controller) = harness_with(config);
        let bucket = create_test_bucket(&service, "drift-slow");
        service.set_latency(Some(Duration::from_millis(500)));

        let err = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await
            .expect_err("deadline elapsed");
        assert!(matches!(err.kind, ErrorKind::Transient(_)), "{err}");
        assert!(service.stored_document(&bucket).is_none());
    }

    #[tokio::test]
    async fn test_should_fail_on_unknown_service_error() {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "drift-fatal");
        service.fail_next(
            RemoteCall::PutConfiguration,
            RemoteError::service("MalformedXML", "The XML you provided was not well-formed"),
        );

        let err = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await
            .expect_err("fatal");
        assert!(matches!(err.kind, ErrorKind::Fatal(_)));
        assert!(!err.is_retryable());
    }
}
