mod common;

use catalog_admin::core::{
    ClientSettings, HttpApiClient, OverlayState, PageController, Resource, ResourceSpec, SubmitRejected,
};
use serde_json::json;
use std::sync::Arc;

fn controller(base_url: &str) -> PageController<HttpApiClient> {
    let mut settings = ClientSettings::new(base_url);
    settings.version = "v1".to_string();
    let api = Arc::new(HttpApiClient::new(settings).unwrap());
    let resource = Resource::try_from(ResourceSpec::architecture()).unwrap();
    PageController::new(api, resource)
}

#[tokio::test]
async fn browse_create_and_refresh() {
    let fixture = common::spawn(25).await;
    let mut ctl = controller(&fixture.base_url);

    let job = ctl.load(1);
    ctl.drive(job).await;
    let table = ctl.table();
    assert_eq!(table.records().len(), 10);
    assert_eq!(table.page_label(), "Page 1/3 · 25 records");
    assert!(!table.nav().prev_enabled);
    assert!(table.nav().next_enabled);
    assert!(ctl.prev_page().is_none());

    let job = ctl.next_page().unwrap();
    ctl.drive(job).await;
    assert_eq!(ctl.table().page(), 2);
    assert_eq!(ctl.table().records()[0].id(), &json!(11));
    assert_eq!(ctl.table().rows(ctl.resource())[9], vec!["20", "arch-20"]);

    // Submitting the create form refreshes the current page once
    let lists_before = fixture.list_calls();
    assert!(ctl.open_form());
    ctl.overlay_mut().set_input("code", "riscv64");
    let job = ctl.submit_form().unwrap();
    ctl.drive(job).await;

    assert_eq!(ctl.overlay().state(), OverlayState::Closed);
    assert_eq!(fixture.list_calls(), lists_before + 1);
    assert_eq!(ctl.table().page(), 2);
    assert_eq!(ctl.table().page_label(), "Page 2/3 · 26 records");
    assert_eq!(ctl.status(), Some("✓ Created Architecture 26"));
}

#[tokio::test]
async fn invalid_form_never_reaches_server() {
    let fixture = common::spawn(1).await;
    let mut ctl = controller(&fixture.base_url);

    ctl.open_form();
    ctl.overlay_mut().set_input("code", "x".repeat(65));
    assert!(matches!(ctl.submit_form(), Err(SubmitRejected::Invalid(_))));
    assert_eq!(ctl.overlay().field_error("code"), Some("Architecture must be at most 64 characters"));
    assert_eq!(fixture.create_calls(), 0);
}

#[tokio::test]
async fn server_rejection_keeps_form_open() {
    let fixture = common::spawn(3).await;
    let mut ctl = controller(&fixture.base_url);

    ctl.open_form();
    ctl.overlay_mut().set_input("code", "arch-1");
    let job = ctl.submit_form().unwrap();
    ctl.drive(job).await;

    assert_eq!(ctl.overlay().state(), OverlayState::Open);
    assert_eq!(ctl.overlay().input("code"), Some("arch-1"));
    assert_eq!(ctl.overlay().field_error("code"), Some("already exists"));
    assert_eq!(fixture.len(), 3);
}

#[tokio::test]
async fn deleting_last_row_steps_back() {
    let fixture = common::spawn(21).await;
    let mut ctl = controller(&fixture.base_url);

    let job = ctl.load(3);
    ctl.drive(job).await;
    assert_eq!(ctl.table().records().len(), 1);

    assert!(ctl.request_delete());
    let job = ctl.confirm_delete().unwrap();
    ctl.drive(job).await;

    assert_eq!(fixture.len(), 20);
    assert_eq!(ctl.table().page(), 2);
    assert_eq!(ctl.table().page_label(), "Page 2/2 · 20 records");
    assert_eq!(ctl.status(), Some("✓ Deleted Architecture 21"));
}

#[tokio::test]
async fn unreachable_server_reports_status() {
    let mut ctl = controller(&common::closed_base_url().await);

    let job = ctl.load(1);
    ctl.drive(job).await;

    assert!(ctl.table().records().is_empty());
    assert!(!ctl.is_busy());
    assert!(ctl.status().is_some_and(|s| s.starts_with("✗ Failed to load page 1: network error")));
}
