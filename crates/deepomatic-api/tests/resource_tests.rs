//! Resource tests against a mock server
//!
//! Tests cover:
//! - Create/update argument checks and HTTP verbs
//! - Public and private URIs, paging
//! - Inference submission, with and without waiting

mod common;

use std::time::Duration;

use deepomatic_api::{
    Client, ClientConfig, Error, HttpError, ImageInput, Inference, InferenceOptions, ResourceId,
    TaskId,
};
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::*;

fn map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn network_payload() -> Map<String, Value> {
    map(json!({
        "name": "My first network",
        "framework": "tensorflow-1.x",
        "preprocessing": {"inputs": []},
    }))
}

#[test]
fn test_network_create() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v0.7/networks/"))
            .and(body_partial_json(json!({"name": "My first network"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"id": 42, "name": "My first network"})),
            ),
    );

    let network = server.client().networks().create(network_payload()).unwrap();
    assert_eq!(network.pk(), &ResourceId::Number(42));
    assert_eq!(network.get("name"), Some(&json!("My first network")));
}

#[test]
fn test_network_create_is_not_retried() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v0.7/networks/"))
            .respond_with(ResponseTemplate::new(503)),
    );

    let err = server.client().networks().create(network_payload()).unwrap_err();
    assert!(matches!(
        err,
        Error::Http(HttpError::ServerError { status: 503, .. })
    ));
    assert_eq!(server.received().len(), 1);
}

#[test]
fn test_create_arguments_are_checked_before_sending() {
    let server = TestServer::start();
    let client = server.client();

    let mut payload = network_payload();
    payload.insert("colour".into(), json!("red"));
    assert!(matches!(
        client.networks().create(payload),
        Err(Error::UnexpectedArgument(name)) if name == "colour"
    ));

    let mut payload = network_payload();
    payload.remove("framework");
    assert!(matches!(
        client.networks().create(payload),
        Err(Error::MissingArgument(name)) if name == "framework"
    ));

    let payload = map(json!({"name": "spec", "outputs": [], "current_version_id": 1}));
    assert!(matches!(
        client.recognition_specs().create(payload),
        Err(Error::UnexpectedArgument(_))
    ));

    assert!(server.received().is_empty());
}

#[test]
fn test_argument_checks_can_be_disabled() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v0.7/recognition/versions/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 3}))),
    );

    let config = ClientConfig::builder()
        .host(server.uri())
        .api_key(API_KEY)
        .version("0.7")
        .check_query_parameters(false)
        .build()
        .unwrap();
    let client = Client::new(config).unwrap();

    let version = client
        .recognition_versions()
        .create(map(json!({"spec_id": 1, "experimental": true})))
        .unwrap();
    assert_eq!(version.pk(), &ResourceId::Number(3));
}

#[test]
fn test_update_patch_and_put() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("PATCH"))
            .and(path("/v0.7/recognition/specs/5/"))
            .and(body_json(json!({"current_version_id": 12})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 5, "current_version_id": 12})),
            ),
    );
    server.mount(
        Mock::given(method("PUT"))
            .and(path("/v0.7/recognition/specs/5/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 5, "name": "renamed"})),
            ),
    );

    let client = server.client();
    let mut spec = client.recognition_specs().object(5u64);
    spec.update(map(json!({"current_version_id": 12})), false)
        .unwrap();
    assert_eq!(spec.get("current_version_id"), Some(&json!(12)));

    spec.update(map(json!({"name": "renamed"})), true).unwrap();
    assert_eq!(spec.get("name"), Some(&json!("renamed")));

    assert!(matches!(
        spec.update(map(json!({"outputs": []})), false),
        Err(Error::ImmutableArgument(_))
    ));
}

#[test]
fn test_retrieve_public_network_and_delete() {
    let server = TestServer::start();
    server.mount(get_json(
        "/networks/public/imagenet-inception-v3/",
        json!({"id": "imagenet-inception-v3", "name": "Inception v3"}),
    ));
    server.mount(
        Mock::given(method("DELETE"))
            .and(path("/v0.7/networks/8/"))
            .respond_with(ResponseTemplate::new(204)),
    );

    let client = server.client();
    let network = client.networks().retrieve("imagenet-inception-v3").unwrap();
    assert_eq!(network.get("name"), Some(&json!("Inception v3")));

    client.networks().object(8u64).delete().unwrap();
}

#[test]
fn test_list_pages() {
    let server = TestServer::start();
    server.mount(get_json(
        "/recognition/specs/",
        json!({
            "count": 3,
            "next": server.api_url("/recognition/specs/page2/"),
            "previous": null,
            "results": [{"id": 1}, {"id": 2}],
        }),
    ));
    server.mount(get_json(
        "/recognition/specs/page2/",
        json!({"count": 3, "next": null, "prev": null, "results": [{"id": 3}]}),
    ));

    let page = server.client().recognition_specs().list(&Map::new()).unwrap();
    assert_eq!(page.count(), 3);
    assert_eq!(page.results().len(), 2);
    assert!(page.has_next());

    let all = page.collect_all().unwrap();
    let pks: Vec<_> = all.iter().map(|spec| spec.pk().to_string()).collect();
    assert_eq!(pks, vec!["1", "2", "3"]);
}

#[test]
fn test_spec_versions() {
    let server = TestServer::start();
    server.mount(get_json(
        "/recognition/specs/5/versions",
        page_json(vec![json!({"id": 10, "spec_id": 5})], None),
    ));

    let client = server.client();
    let versions = client
        .recognition_specs()
        .object(5u64)
        .versions(&Map::new())
        .unwrap();
    assert_eq!(versions.results()[0].pk(), &ResourceId::Number(10));
}

#[test]
fn test_inference_waits_for_task() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v0.7/networks/public/imagenet-inception-v3/inference"))
            .and(body_partial_json(json!({
                "output_layers": ["prob"],
                "inputs": [{"image": {"source": "https://example.com/dog.jpg"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": 77}))),
    );
    server.mount(task_mock(77, "pending").up_to_n_times(1));
    server.mount(task_mock(77, "success"));

    let client = server.client();
    let network = client.networks().object("imagenet-inception-v3");
    let options = InferenceOptions::new()
        .with_wait(fast_wait(Duration::from_secs(5)))
        .with_param("output_layers", json!(["prob"]));
    let inputs = [ImageInput::from_url("https://example.com/dog.jpg").unwrap()];

    let result = network.inference(&inputs, &options).unwrap();
    assert_eq!(result, Inference::Completed(json!({"outputs": [77]})));
}

#[test]
fn test_inference_without_wait() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v0.7/recognition/specs/5/inference"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "abc"}))),
    );

    let client = server.client();
    let inputs = [ImageInput::from_bytes(vec![1, 2, 3])];
    let result = client
        .recognition_specs()
        .object(5u64)
        .inference(&inputs, &InferenceOptions::new().no_wait())
        .unwrap();

    match result {
        Inference::Submitted(task) => assert_eq!(task.id(), &TaskId::from("abc")),
        other => panic!("expected a submitted task, got {other:?}"),
    }
    let body: Value = serde_json::from_slice(&server.received()[0].body).unwrap();
    assert_eq!(body["inputs"][0]["image"]["source"], "data:image/*;base64,AQID");
}

#[test]
fn test_inference_failed_task() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v0.7/recognition/versions/3/inference"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": 78}))),
    );
    server.mount(task_mock(78, "error"));

    let client = server.client();
    let inputs = [ImageInput::from_url("https://example.com/dog.jpg").unwrap()];
    let err = client
        .recognition_versions()
        .object(3u64)
        .inference(
            &inputs,
            &InferenceOptions::new().with_wait(fast_wait(Duration::from_secs(5))),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Task(ref e) if e.is_failed()));
}
