//! Create, read, update and destroy scenarios.

#[cfg(test)]
mod tests {
    use sitecfg_engine::{EngineConfig, ErrorKind, Operation, PlanAction};
    use sitecfg_model::{DesiredConfiguration, Protocol};

    use crate::{create_test_bucket, harness, harness_with};

    #[tokio::test]
    async fn test_should_create_index_document_and_read_back() -> anyhow::Result<()> {
        let config = EngineConfig::builder()
            .default_region("us-west-2".into())
            .build();
        let (service, controller) = harness_with(config);
        let bucket = create_test_bucket(&service, "basic");

        let desired = DesiredConfiguration::new(&bucket).with_index_document("index.html");
        let id = controller.create(&desired).await?;
        assert_eq!(id.encode(), bucket);

        let actual = controller.read(&id).await?.expect("configuration present");
        let index = actual
            .configuration
            .index_document
            .as_ref()
            .map(|d| d.suffix.as_str());
        assert_eq!(index, Some("index.html"));
        assert_eq!(actual.website_domain, "s3-website-us-west-2.amazonaws.com");
        assert_eq!(
            actual.website_endpoint,
            format!("{bucket}.s3-website-us-west-2.amazonaws.com")
        );
        assert!(actual.routing_rules_json().is_none());

        let plan = controller.reconcile(Some(&id), Some(&desired)).await?;
        assert_eq!(plan.action, PlanAction::NoOp);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_use_dotted_domain_for_newer_regions() -> anyhow::Result<()> {
        let config = EngineConfig::builder()
            .default_region("eu-central-1".into())
            .build();
        let (service, controller) = harness_with(config);
        let bucket = create_test_bucket(&service, "region");

        let id = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await?;
        let actual = controller.read(&id).await?.expect("configuration present");
        assert_eq!(actual.website_domain, "s3-website.eu-central-1.amazonaws.com");
        Ok(())
    }

    #[tokio::test]
    async fn test_should_update_index_and_error_documents() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "update");

        let id = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await?;

        let updated = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_error_document("error.html");
        controller.update(&id, &updated).await?;

        let actual = controller.read(&id).await?.expect("configuration present");
        let error_key = actual
            .configuration
            .error_document
            .as_ref()
            .map(|d| d.key.as_str());
        assert_eq!(error_key, Some("error.html"));
        Ok(())
    }

    #[tokio::test]
    async fn test_should_switch_to_redirect_all_requests() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "redirect");

        let id = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await?;

        let redirect = DesiredConfiguration::new(&bucket)
            .with_redirect_all_requests_to("example.com", Some(Protocol::Https));
        let plan = controller.reconcile(Some(&id), Some(&redirect)).await?;
        assert_eq!(plan.action, PlanAction::Update);

        let actual = controller.read(&id).await?.expect("configuration present");
        assert!(actual.configuration.index_document.is_none());
        let target = actual
            .configuration
            .redirect_all_requests_to
            .expect("redirect target");
        assert_eq!(target.host_name, "example.com");
        assert_eq!(target.protocol, Some(Protocol::Https));
        Ok(())
    }

    #[tokio::test]
    async fn test_should_destroy_and_verify_absence() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "destroy");

        let id = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await?;
        controller.delete(&id).await?;

        assert!(controller.read(&id).await?.is_none());
        assert!(service.stored_document(&bucket).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_should_drop_resource_when_configuration_disappears() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "disappears");

        let id = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await?;
        assert!(service.remove_configuration(&bucket));

        assert!(controller.read(&id).await?.is_none());

        let plan = controller
            .reconcile(
                Some(&id),
                Some(&DesiredConfiguration::new(&bucket).with_index_document("index.html")),
            )
            .await?;
        assert_eq!(plan.action, PlanAction::Create);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_drop_resource_when_bucket_disappears() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "bucket-gone");

        let id = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await?;
        assert!(service.delete_bucket(&bucket));

        assert!(controller.read(&id).await?.is_none());
        controller.delete(&id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_should_reject_directory_bucket() {
        let (service, controller) = harness();
        let bucket = format!("{}--usw2-az1--x-s3", crate::test_bucket_name("dir"));
        service.create_bucket(&bucket);

        let err = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await
            .expect_err("directory bucket must be rejected");

        assert_eq!(err.operation, Operation::Create);
        assert!(matches!(err.kind, ErrorKind::UnsupportedTarget(_)));
        assert!(err.to_string().contains("directory buckets are not supported"));
        assert_eq!(service.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_should_fail_create_on_missing_bucket() {
        let (_service, controller) = harness();
        let bucket = crate::test_bucket_name("missing");

        let err = controller
            .create(&DesiredConfiguration::new(&bucket).with_index_document("index.html"))
            .await
            .expect_err("bucket does not exist");
        assert_eq!(err.kind, ErrorKind::BucketNotFound);
        assert_eq!(err.identifier, bucket);
    }
}
