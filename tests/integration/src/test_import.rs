//! Import scenarios.

#[cfg(test)]
mod tests {
    use sitecfg_core::AccountId;
    use sitecfg_engine::{ErrorKind, Operation, ResourceIdentifier};
    use sitecfg_model::{DesiredConfiguration, StructuredRedirect, StructuredRoutingRule};

    use crate::{create_test_bucket, harness, test_bucket_name};

    #[tokio::test]
    async fn test_should_import_and_match_read() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "import");

        let desired = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_error_document("error.html")
            .with_routing_rule_blocks(vec![StructuredRoutingRule::redirect(
                StructuredRedirect {
                    replace_key_with: Some("error.html".to_owned()),
                    ..StructuredRedirect::default()
                },
            )]);
        let id = controller.create(&desired).await?;

        let (imported, actual) = controller.import(&id.encode()).await?;
        assert_eq!(imported, id);
        assert_eq!(Some(actual), controller.read(&id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_import_with_expected_owner() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let owner = AccountId::new("123456789012")?;
        let bucket = test_bucket_name("import-owner");
        service.create_bucket_owned_by(&bucket, &owner);

        let desired = DesiredConfiguration::new(&bucket)
            .with_expected_owner(owner.as_str())
            .with_index_document("index.html");
        let id = controller.create(&desired).await?;
        assert_eq!(id.encode(), format!("{bucket},123456789012"));

        let (imported, _) = controller.import(&format!("{bucket},123456789012")).await?;
        assert_eq!(imported.expected_owner(), Some(&owner));
        assert_eq!(imported, ResourceIdentifier::decode(&id.encode())?);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_fail_import_for_wrong_owner() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let owner = AccountId::new("123456789012")?;
        let bucket = test_bucket_name("import-denied");
        service.create_bucket_owned_by(&bucket, &owner);
        controller
            .create(
                &DesiredConfiguration::new(&bucket)
                    .with_expected_owner(owner.as_str())
                    .with_index_document("index.html"),
            )
            .await?;

        let err = controller
            .import(&format!("{bucket},999999999999"))
            .await
            .expect_err("owner mismatch");
        assert!(matches!(err.kind, ErrorKind::Fatal(_)), "{err}");
        assert!(!err.is_retryable());
        Ok(())
    }

    #[tokio::test]
    async fn test_should_fail_import_when_nothing_configured() {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "import-empty");

        let err = controller.import(&bucket).await.expect_err("not configured");
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.operation, Operation::Import);
        assert_eq!(err.identifier, bucket);
    }

    #[tokio::test]
    async fn test_should_reject_malformed_identifier_without_remote_calls() {
        let (service, controller) = harness();

        for bad in ["", "site,", "site,1234", "a,123456789012,b"] {
            let err = controller.import(bad).await.expect_err("malformed");
            assert!(
                matches!(err.kind, ErrorKind::MalformedIdentifier(_)),
                "{bad:?}: {err}"
            );
        }
        assert_eq!(service.total_calls(), 0);
    }
}
