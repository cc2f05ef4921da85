//! Click handling: settings read, tab opening and toasts

use std::time::Duration;

use serde_json::{json, Map, Value};
use sspcloud_core::{Forge, ForgeKind, LaunchError, Settings};
use sspcloud_page::assets::TOAST_CLASS;
use sspcloud_page::memory::{MemoryDom, RecordingHost};
use sspcloud_page::toast::{NO_IDENTITY_MESSAGE, POPUP_BLOCKED_MESSAGE};
use sspcloud_page::{ClickOutcome, ContentScript, Dom, ElementSpec, PageForge, Selector};
use sspcloud_registry::{MemoryStorage, SettingsStore};

const DEFAULT_BASE: &str = "https://datalab.sspcloud.fr/launcher/ide/vscode-python?";

fn github_script(url: &str, host: RecordingHost) -> ContentScript<MemoryDom, RecordingHost> {
    let mut dom = MemoryDom::new(url);
    let body = dom.body_node();
    dom.append(body, ElementSpec::new("div").id("repository-container-header"));
    dom.append(body, ElementSpec::new("ul").class("pagehead-actions"));
    let mut script = ContentScript::new(dom, host, PageForge::Github);
    script.start();
    script
}

fn gitlab_script(url: &str) -> ContentScript<MemoryDom, RecordingHost> {
    let mut dom = MemoryDom::new(url);
    let body = dom.body_node();
    dom.set_attribute(body, "data-page", "projects:show");
    dom.append(body, ElementSpec::new("div").class("project-repo-buttons"));
    let mut script = ContentScript::new(dom, RecordingHost::new(), PageForge::Gitlab);
    script.start();
    script
}

fn snapshot(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn toast_texts(script: &ContentScript<MemoryDom, RecordingHost>) -> Vec<String> {
    let dom = script.dom();
    dom.query_all(&Selector::class(TOAST_CLASS))
        .into_iter()
        .map(|toast| dom.text(toast).to_string())
        .collect()
}

#[tokio::test]
async fn test_click_opens_default_launcher() {
    let mut script = github_script("https://github.com/org/repo", RecordingHost::new());

    let outcome = script.click(|| async { Ok(Settings::default()) }).await;

    let ClickOutcome::Opened(url) = outcome else {
        panic!("expected an opened tab, got {:?}", outcome);
    };
    assert!(url.starts_with(DEFAULT_BASE));
    assert!(url.contains("git.repository=%C2%ABhttps%3A%2F%2Fgithub.com%2Forg%2Frepo%C2%BB"));
    assert_eq!(script.host().opened_tabs(), vec![url.as_str()]);
    assert!(toast_texts(&script).is_empty());
}

#[tokio::test]
async fn test_click_uses_stored_launcher_config() {
    let storage = MemoryStorage::with_snapshot(snapshot(json!({
        "baseUrl": "https://datalab.example.org/launcher/ide/jupyter",
        "version": "9.9.9"
    })));
    let store = SettingsStore::new(storage);
    let mut script = github_script("https://github.com/org/repo", RecordingHost::new());

    let outcome = script.click(|| store.load()).await;

    let ClickOutcome::Opened(url) = outcome else {
        panic!("expected an opened tab, got {:?}", outcome);
    };
    assert!(url.starts_with("https://datalab.example.org/launcher/ide/jupyter?"));
    assert!(url.contains("version=9.9.9"));
}

#[tokio::test]
async fn test_gitlab_template_with_nested_groups() {
    let store = SettingsStore::new(MemoryStorage::new());
    store
        .upsert_forge(
            Forge::new("gitlab.example.com", ForgeKind::Gitlab)
                .unwrap()
                .with_template("https://launch.example.org/{owner}/{repo}"),
        )
        .await
        .unwrap();

    let mut script = gitlab_script("https://gitlab.example.com/group/sub/proj/-/tree/main");
    let outcome = script.click(|| store.load()).await;

    assert_eq!(
        outcome,
        ClickOutcome::Opened("https://launch.example.org/group/sub/proj".to_string())
    );
}

#[tokio::test]
async fn test_project_path_attribute_beats_url() {
    let mut script = gitlab_script("https://gitlab.example.com/old-group/proj");
    let body = script.dom().body_node();
    script.dom_mut().append(
        body,
        ElementSpec::new("div").attr("data-project-full-path", "new-group/team/proj"),
    );
    let settings = Settings::from_snapshot(&snapshot(json!({
        "forges": [{
            "domain": "gitlab.example.com",
            "type": "gitlab",
            "urlTemplate": "https://l/{owner}/{repo}"
        }]
    })));

    let outcome = script.click(|| async move { Ok(settings) }).await;
    assert_eq!(
        outcome,
        ClickOutcome::Opened("https://l/new-group/team/proj".to_string())
    );
}

#[tokio::test]
async fn test_unreadable_settings_fall_back_to_defaults() {
    let mut script = github_script("https://github.com/org/repo", RecordingHost::new());

    let outcome = script
        .click(|| async { Err(LaunchError::Storage("quota exceeded".to_string())) })
        .await;

    let ClickOutcome::Opened(url) = outcome else {
        panic!("expected an opened tab, got {:?}", outcome);
    };
    assert!(url.starts_with(DEFAULT_BASE));
}

#[tokio::test]
async fn test_blocked_popup_shows_toast() {
    let mut script = github_script("https://github.com/org/repo", RecordingHost::blocking_popups());

    let outcome = script.click(|| async { Ok(Settings::default()) }).await;

    assert!(matches!(outcome, ClickOutcome::Blocked(_)));
    assert_eq!(script.host().opened_tabs().len(), 1);
    assert_eq!(toast_texts(&script), vec![POPUP_BLOCKED_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_missing_identity_shows_toast_and_opens_nothing() {
    let mut script = gitlab_script("https://gitlab.example.com/");

    let outcome = script.click(|| async { Ok(Settings::default()) }).await;

    assert_eq!(outcome, ClickOutcome::NoIdentity);
    assert!(script.host().opened_tabs().is_empty());
    assert_eq!(toast_texts(&script), vec![NO_IDENTITY_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_toast_fades_then_is_removed() {
    let mut script = gitlab_script("https://gitlab.example.com/");
    script.click(|| async { Ok(Settings::default()) }).await;
    let toast = script.dom().query(&Selector::class(TOAST_CLASS)).unwrap();

    script.advance(Duration::from_millis(2999));
    assert!(!script.dom().has_class(&toast, "fade-out"));

    script.advance(Duration::from_millis(1));
    assert!(script.dom().has_class(&toast, "fade-out"));
    assert_eq!(script.live_toasts(), 1);

    script.advance(Duration::from_millis(400));
    assert!(!script.dom().is_connected(toast));
    assert_eq!(script.live_toasts(), 0);
}

#[tokio::test]
async fn test_repository_is_captured_before_settings_resolve() {
    let mut script = github_script("https://github.com/org/first", RecordingHost::new());

    let request = script.begin_click().unwrap();
    // A navigation lands while settings are being read
    script.dom_mut().set_url("https://github.com/org/second");
    let url = request.resolve_url(&Settings::default());
    let outcome = script.complete_click(url);

    let ClickOutcome::Opened(url) = outcome else {
        panic!("expected an opened tab, got {:?}", outcome);
    };
    assert!(url.contains("github.com%2Forg%2Ffirst"));
    assert!(!url.contains("second"));
}
