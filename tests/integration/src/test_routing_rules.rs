//! Routing rule scenarios in both declaration forms.

#[cfg(test)]
mod tests {
    use sitecfg_engine::{ErrorKind, PlanAction, WebsiteAttribute};
    use sitecfg_model::{
        DesiredConfiguration, Protocol, StructuredCondition, StructuredRedirect,
        StructuredRoutingRule,
    };

    use crate::{create_test_bucket, harness};

    const DOCS_RULES: &str =
        r#"[{"Condition":{"KeyPrefixEquals":"docs/"},"Redirect":{"ReplaceKeyPrefixWith":"documents/"}}]"#;

    fn prefix_rule(prefix: &str, replacement: &str) -> StructuredRoutingRule {
        StructuredRoutingRule::redirect(StructuredRedirect {
            replace_key_prefix_with: Some(replacement.to_owned()),
            ..StructuredRedirect::default()
        })
        .when(StructuredCondition {
            key_prefix_equals: Some(prefix.to_owned()),
            ..StructuredCondition::default()
        })
    }

    #[tokio::test]
    async fn test_should_expose_serialized_rules_after_structured_create() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "rule-cond");

        let desired = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rule_blocks(vec![prefix_rule("docs/", "documents/")]);
        let id = controller.create(&desired).await?;

        let actual = controller.read(&id).await?.expect("configuration present");
        assert_eq!(actual.routing_rules_json().as_deref(), Some(DOCS_RULES));
        Ok(())
    }

    #[tokio::test]
    async fn test_should_keep_multiple_rules_in_order() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "rule-multi");

        let error_rule = StructuredRoutingRule::redirect(StructuredRedirect {
            host_name: Some("example.com".to_owned()),
            http_redirect_code: Some("302".to_owned()),
            protocol: Some("https".to_owned()),
            replace_key_with: Some("errorpage.html".to_owned()),
            ..StructuredRedirect::default()
        })
        .when(StructuredCondition {
            http_error_code_returned_equals: Some("404".to_owned()),
            ..StructuredCondition::default()
        });
        let desired = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rule_blocks(vec![prefix_rule("images/", "photos/"), error_rule]);
        let id = controller.create(&desired).await?;

        let actual = controller.read(&id).await?.expect("configuration present");
        let rules = actual
            .configuration
            .routing_rules
            .as_ref()
            .expect("rules present");
        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules.rules()[0]
                .condition
                .as_ref()
                .and_then(|c| c.key_prefix_equals.as_deref()),
            Some("images/")
        );
        let second = &rules.rules()[1].redirect;
        assert_eq!(second.http_redirect_code.as_deref(), Some("302"));
        assert_eq!(second.protocol, Some(Protocol::Https));
        Ok(())
    }

    #[tokio::test]
    async fn test_should_accept_redirect_only_rule() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "rule-redirect");

        let rule = StructuredRoutingRule::redirect(StructuredRedirect {
            replace_key_prefix_with: Some("documents/".to_owned()),
            ..StructuredRedirect::default()
        });
        let desired = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rule_blocks(vec![rule]);
        let id = controller.create(&desired).await?;

        let actual = controller.read(&id).await?.expect("configuration present");
        assert_eq!(
            actual.routing_rules_json().as_deref(),
            Some(r#"[{"Redirect":{"ReplaceKeyPrefixWith":"documents/"}}]"#)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_should_round_trip_empty_string_replacement() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "rule-empty");

        let json = r#"[{"Condition":{"KeyPrefixEquals":"docs/"},"Redirect":{"ReplaceKeyPrefixWith":""}}]"#;
        let desired = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rules_json(json);
        let id = controller.create(&desired).await?;

        let actual = controller.read(&id).await?.expect("configuration present");
        assert_eq!(actual.routing_rules_json().as_deref(), Some(json));

        let plan = controller.reconcile(Some(&id), Some(&desired)).await?;
        assert!(plan.is_noop(), "{plan}");
        Ok(())
    }

    #[tokio::test]
    async fn test_should_round_trip_values_that_need_escaping() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "rule-escape");

        let json = r#"[{"Condition":{"KeyPrefixEquals":" docs & more "},"Redirect":{"ReplaceKeyWith":"it's <here>.html"}}]"#;
        let desired = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_error_document("errors/a&b.html")
            .with_routing_rules_json(json);
        let id = controller.create(&desired).await?;

        let actual = controller.read(&id).await?.expect("configuration present");
        assert_eq!(actual.routing_rules_json().as_deref(), Some(json));
        assert_eq!(
            actual
                .configuration
                .error_document
                .as_ref()
                .map(|doc| doc.key.as_str()),
            Some("errors/a&b.html")
        );

        let plan = controller.reconcile(Some(&id), Some(&desired)).await?;
        assert_eq!(plan.action, PlanAction::NoOp);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_not_update_when_switching_rule_form() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "rule-switch");

        let structured = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rule_blocks(vec![prefix_rule("docs/", "documents/")]);
        let id = controller.create(&structured).await?;

        let serialized = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rules_json(DOCS_RULES);
        let plan = controller.reconcile(Some(&id), Some(&serialized)).await?;
        assert_eq!(plan.action, PlanAction::NoOp);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_update_serialized_rules() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "rule-update");

        let v1 = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rules_json(DOCS_RULES);
        let id = controller.create(&v1).await?;

        let v2_json = DOCS_RULES.replace("documents/", "documents-v2/");
        let v2 = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rules_json(v2_json.clone());
        let plan = controller.reconcile(Some(&id), Some(&v2)).await?;
        assert_eq!(plan.action, PlanAction::Update);
        assert_eq!(plan.changed_attributes(), vec![WebsiteAttribute::RoutingRules]);

        let actual = controller.read(&id).await?.expect("configuration present");
        let read_back: serde_json::Value =
            serde_json::from_str(&actual.routing_rules_json().expect("rules present"))?;
        let expected: serde_json::Value = serde_json::from_str(&v2_json)?;
        assert_eq!(read_back, expected);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_remove_rules_entirely() -> anyhow::Result<()> {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "rule-remove");

        let with_rules = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rule_blocks(vec![prefix_rule("docs/", "documents/")]);
        let id = controller.create(&with_rules).await?;

        let without = DesiredConfiguration::new(&bucket).with_index_document("index.html");
        let plan = controller.reconcile(Some(&id), Some(&without)).await?;
        assert_eq!(plan.action, PlanAction::Update);
        let diff = &plan.attribute_diffs[&WebsiteAttribute::RoutingRules];
        assert!(diff.before.is_some());
        assert!(diff.after.is_none());

        let actual = controller.read(&id).await?.expect("configuration present");
        assert!(actual.configuration.routing_rules.is_none());

        let empty_list = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rules_json("[]");
        let plan = controller.reconcile(Some(&id), Some(&empty_list)).await?;
        assert!(plan.is_noop());
        Ok(())
    }

    #[tokio::test]
    async fn test_should_reject_malformed_rules_locally() {
        let (service, controller) = harness();
        let bucket = create_test_bucket(&service, "rule-bad");

        let desired = DesiredConfiguration::new(&bucket)
            .with_index_document("index.html")
            .with_routing_rules_json(r#"[{"Condition":{"KeyPrefixEquals":"docs/"}}]"#);
        let err = controller
            .create(&desired)
            .await
            .expect_err("rule without redirect");
        assert!(matches!(err.kind, ErrorKind::IncompleteAttributeGroup(_)));

        let desired = DesiredConfiguration::new(&bucket).with_routing_rules_json("{not json");
        let err = controller.create(&desired).await.expect_err("bad json");
        assert!(matches!(err.kind, ErrorKind::InvalidAttribute(_)));

        assert_eq!(service.total_calls(), 0);
    }
}
