mod support;

use std::time::{Duration, Instant};

use chembl_tools::{ErrorKind, InvocationError};
use serde_json::json;

#[tokio::test]
async fn registers_whole_catalog() {
    let (service, _) = support::service();
    let registry = service.dispatcher().registry();

    assert_eq!(registry.len(), 46);
    assert!(registry.contains("highlight_smiles_fragment_svg"));

    let deadlines: Vec<(String, Duration)> = service
        .dispatcher()
        .describe()
        .with_deadlines()
        .map(|(descriptor, deadline)| (descriptor.name().to_string(), deadline))
        .collect();
    assert_eq!(deadlines[0], ("activity".to_owned(), Duration::from_secs(10)));
    let canonical = deadlines
        .iter()
        .find(|(name, _)| name == "canonicalize_smiles")
        .unwrap();
    assert_eq!(canonical.1, Duration::from_millis(300));
}

#[tokio::test]
async fn data_query_forwards_single_criterion() {
    let (service, fake) = support::service();

    let value = service
        .dispatcher()
        .invoke("drug", json!({"drug_type": "1"}))
        .await
        .unwrap();

    assert_eq!(value, json!([{"resource": "drug"}]));
    assert_eq!(fake.calls(), vec![r#"filter drug drug_type="1""#.to_owned()]);
}

#[tokio::test]
async fn criteria_follow_declared_order() {
    let (service, fake) = support::service();

    service
        .dispatcher()
        .invoke(
            "chembl_id_lookup",
            json!({"q": "aspirin", "available_type": "COMPOUND"}),
        )
        .await
        .unwrap();

    assert_eq!(
        fake.calls(),
        vec![r#"filter chembl_id_lookup available_type="COMPOUND",q="aspirin""#.to_owned()]
    );
}

#[tokio::test]
async fn integer_parameters_are_type_checked() {
    let (service, fake) = support::service();

    let err = service
        .dispatcher()
        .invoke("organism", json!({"tax_id": "9606"}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    assert!(fake.calls().is_empty());

    service
        .dispatcher()
        .invoke("organism", json!({"tax_id": 9606}))
        .await
        .unwrap();
    assert_eq!(fake.calls(), vec!["filter organism tax_id=9606".to_owned()]);
}

#[tokio::test]
async fn release_lists_without_filter() {
    let (service, fake) = support::service();

    let value = service
        .dispatcher()
        .invoke("chembl_release", serde_json::Value::Null)
        .await
        .unwrap();

    assert_eq!(value, json!([]));
    assert_eq!(fake.calls(), vec!["all chembl_release".to_owned()]);
}

#[tokio::test]
async fn utility_results_take_declared_shape() {
    let (service, _) = support::service();
    let dispatcher = service.dispatcher();

    assert_eq!(
        dispatcher.invoke("is_3d", json!({"smiles": "CCO"})).await.unwrap(),
        json!(false)
    );
    assert_eq!(
        dispatcher
            .invoke("chembl_descriptors", json!({"smiles": "CCO"}))
            .await
            .unwrap(),
        json!({"qed_weighted": 0.41})
    );
    assert_eq!(
        dispatcher.invoke("status", json!({})).await.unwrap(),
        json!({"status": "UP"})
    );
}

#[tokio::test]
async fn two_input_utility_passes_both_in_order() {
    let (service, fake) = support::service();

    service
        .dispatcher()
        .invoke(
            "highlight_smiles_fragment_svg",
            json!({"fragment": "O", "smiles": "CCO"}),
        )
        .await
        .unwrap();

    assert_eq!(
        fake.calls(),
        vec![r#"call highlightSmilesFragmentSvg smiles="CCO",fragment="O""#.to_owned()]
    );
}

#[tokio::test]
async fn upstream_errors_are_classified() {
    let (service, _) = support::service();

    let err = service
        .dispatcher()
        .invoke("tissue", json!({"tissue_name": "liver"}))
        .await
        .unwrap_err();

    match err {
        InvocationError::UpstreamFailure { operation, reason } => {
            assert_eq!(operation, "tissue");
            assert!(reason.contains("database offline"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn wrong_result_shape_is_an_upstream_failure() {
    let (service, _) = support::service();

    let err = service
        .dispatcher()
        .invoke("get_parent", json!({"chembl_id": "CHEMBL25"}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    assert!(err.to_string().contains("expected text result, got object"));
}

#[tokio::test]
async fn slow_utility_hits_category_deadline() {
    let (service, _) = support::service();

    let started = Instant::now();
    let err = service
        .dispatcher()
        .invoke("standardize", json!({"smiles": "CCO"}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_millis(1500));
}
