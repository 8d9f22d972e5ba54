use lodestar_common::protocol::LocatorStrategy;
use lodestar_engine::LocatorEngine;
use lodestar_engine::backend::Backend;
use lodestar_engine::config::LodestarConfig;
use lodestar_engine::config::schema::PrototypeConfig;
use lodestar_engine::models::ModelService;
use lodestar_engine::models::embedding::WordVectors;
use lodestar_engine::resolution::extractor::extract;
use lodestar_h::HeadlessBackend;
use serial_test::serial;
use std::sync::Arc;

const PAGE: &str = "<html><head><title>Login</title></head><body>\
<label for='user'>Username</label><input id='user' name='username'>\
<input name='hidden_field' style='display:none'>\
<button>Login</button>\
<shadow-host></shadow-host>\
<script>\
const host = document.querySelector('shadow-host');\
const root = host.attachShadow({mode: 'open'});\
root.innerHTML = \"<button id='shadow-btn'>Accept cookies</button>\";\
</script></body></html>";

async fn launch() -> Option<HeadlessBackend> {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .ok();

    let mut backend = HeadlessBackend::new();
    if let Err(e) = backend.launch().await {
        eprintln!("Failed to launch browser (is Chromium installed?): {}", e);
        return None;
    }
    let url = format!("data:text/html,{}", PAGE);
    let nav = backend.navigate(&url).await.expect("Navigation failed");
    assert_eq!(nav.title, "Login");
    Some(backend)
}

#[tokio::test]
#[serial]
async fn test_extraction_reaches_shadow_roots() {
    let Some(mut backend) = launch().await else {
        return;
    };

    let elements = extract(&mut backend).await.expect("extraction failed");
    let username = elements
        .iter()
        .find(|e| e.name.as_deref() == Some("username"))
        .expect("username input");
    assert_eq!(username.label_text.as_deref(), Some("Username"));
    assert!(elements.iter().all(|e| e.name.as_deref() != Some("hidden_field")));

    let shadow = elements
        .iter()
        .find(|e| e.id.as_deref() == Some("shadow-btn"))
        .expect("shadow button");
    assert_eq!(shadow.shadow_depth, 1);
    assert_eq!(shadow.text.as_deref(), Some("Accept cookies"));

    let matches = backend
        .find_all(&LocatorStrategy::ById("shadow-btn".into()).selector())
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].is_interactable());

    let matches = backend
        .find_all(
            &LocatorStrategy::ByTextExact {
                tag: "button".into(),
                text: "Login".into(),
            }
            .selector(),
        )
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);

    backend.close().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_resolve_against_live_page() {
    let Some(mut backend) = launch().await else {
        return;
    };

    let vectors = WordVectors::from_entries(vec![
        ("username".to_string(), vec![0.0, 1.0, 0.0]),
        ("input".to_string(), vec![0.0, 1.0, 0.0]),
        ("enter".to_string(), vec![0.0, 1.0, 0.0]),
        ("logo".to_string(), vec![1.0, 0.0, 0.0]),
        ("button".to_string(), vec![0.0, 0.0, 1.0]),
        ("login".to_string(), vec![0.0, 0.0, 1.0]),
    ]);
    let models = ModelService::with_providers(Box::new(vectors), None, &PrototypeConfig::default())
        .await
        .unwrap();
    let mut engine = LocatorEngine::new(Arc::new(models), LodestarConfig::default());

    let resolved = engine.resolve(&mut backend, "enter username").await.unwrap();
    assert_eq!(resolved.strategy, LocatorStrategy::ById("user".into()));

    let resolved = engine.resolve(&mut backend, "click login").await.unwrap();
    assert_eq!(
        resolved.strategy,
        LocatorStrategy::ByTextExact {
            tag: "button".into(),
            text: "Login".into()
        }
    );

    backend.close().await.unwrap();
}
