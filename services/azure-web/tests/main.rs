use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::debug;
use pretty_assertions::assert_eq;
use runpkg_azure_storage::{
    Deriver, ServiceSasRequest, SharedKeyDataPlane, StorageAccountKey, StorageDataPlane,
};
use runpkg_azure_web::constants::*;
use runpkg_azure_web::{deploy, FunctionAppStack, MemoryProvisioner, StackConfig};
use runpkg_core::{
    Context, Error, ErrorKind, Provision, ResourceRequest, ResourceState, Result, Stack, REDACTED,
};

type Events = Arc<Mutex<Vec<String>>>;

/// Forwards to the shared-key data plane, logging every call.
#[derive(Debug)]
struct TracingDataPlane {
    inner: SharedKeyDataPlane,
    events: Events,
    fail_sas: bool,
}

#[async_trait]
impl StorageDataPlane for TracingDataPlane {
    async fn list_service_sas(&self, ctx: &Context, req: &ServiceSasRequest) -> Result<String> {
        self.events
            .lock()
            .unwrap()
            .push(format!("sas {}", req.canonicalized_resource));
        if self.fail_sas {
            return Err(Error::data_plane_failed("ListServiceSas returned 403"));
        }
        self.inner.list_service_sas(ctx, req).await
    }

    async fn list_account_keys(
        &self,
        ctx: &Context,
        resource_group: &str,
        account_name: &str,
    ) -> Result<Vec<StorageAccountKey>> {
        self.events.lock().unwrap().push(format!("keys {account_name}"));
        self.inner
            .list_account_keys(ctx, resource_group, account_name)
            .await
    }
}

/// Forwards to the memory engine, logging every creation.
#[derive(Debug)]
struct TracingEngine {
    inner: MemoryProvisioner,
    events: Events,
}

#[async_trait]
impl Provision for TracingEngine {
    async fn create_resource(&self, ctx: &Context, req: ResourceRequest) -> Result<ResourceState> {
        self.events
            .lock()
            .unwrap()
            .push(format!("create {}", req.kind));
        self.inner.create_resource(ctx, req).await
    }
}

struct Fixture {
    stack: Stack,
    deriver: Deriver,
    engine: MemoryProvisioner,
    events: Events,
}

fn fixture(fail_sas: bool) -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();

    let events = Events::default();
    let engine = MemoryProvisioner::new();
    let stack = Stack::new(
        Context::new(),
        TracingEngine {
            inner: engine.clone(),
            events: events.clone(),
        },
    );
    let deriver = Deriver::new(
        Context::new(),
        TracingDataPlane {
            inner: SharedKeyDataPlane::new().with_account_key("storacct", "a2V5"),
            events: events.clone(),
            fail_sas,
        },
    );

    Fixture {
        stack,
        deriver,
        engine,
        events,
    }
}

fn config(mut config: StackConfig) -> StackConfig {
    config.storage_account_name = Some("storacct".to_string());
    config
}

fn position(events: &[String], event: &str) -> usize {
    events
        .iter()
        .position(|e| e == event)
        .unwrap_or_else(|| panic!("event {event:?} not found in {events:?}"))
}

#[tokio::test]
async fn test_web_app_runs_from_signed_package() -> Result<()> {
    let f = fixture(false);

    let outputs = deploy(&f.stack, &f.deriver, &config(StackConfig::web())).await?;
    debug!("outputs: {outputs:?}");

    let url = outputs.get(DEPLOYMENT_ZIP_URL).unwrap();
    assert!(!url.is_secret());
    assert!(url
        .reveal()
        .starts_with("https://storacct.blob.core.windows.net/deploymentzips/blazorserver.zip?sv=2018-11-09&"));

    let app_url = outputs.get(APP_SERVICE_URL).unwrap().reveal();
    assert!(app_url.starts_with("https://blazorserverappservice"));
    assert!(app_url.ends_with(".azurewebsites.net"));

    let key = outputs.get(PRIMARY_STORAGE_KEY).unwrap();
    assert!(key.is_secret());
    assert_eq!(key.reveal(), "a2V5");

    let app = f
        .engine
        .requests()
        .into_iter()
        .find(|r| r.kind == WEB_APP)
        .unwrap();
    let settings = &app.properties["siteConfig"]["appSettings"];
    assert_eq!(settings[0]["name"], WEBSITE_RUN_FROM_PACKAGE);
    assert_eq!(settings[0]["value"], url.reveal());
    assert_eq!(settings[1]["name"], APPLICATIONINSIGHTS_CONNECTION_STRING);
    assert!(settings[1]["value"]
        .as_str()
        .unwrap()
        .starts_with("InstrumentationKey="));
    assert!(!app.secret);
    Ok(())
}

#[tokio::test]
async fn test_app_is_requested_after_sas() -> Result<()> {
    let f = fixture(false);

    deploy(&f.stack, &f.deriver, &config(StackConfig::function())).await?;

    let events = f.events.lock().unwrap().clone();
    let sas = position(&events, "sas /blob/storacct/functionzips");
    let blob = position(&events, &format!("create {BLOB}"));
    let app = position(&events, &format!("create {WEB_APP}"));
    assert!(blob < sas, "sas requested before the blob existed: {events:?}");
    assert!(sas < app, "app requested before the sas: {events:?}");

    // Exactly one sas, shared by the app setting and the stack output.
    assert_eq!(events.iter().filter(|e| e.starts_with("sas ")).count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_app_is_never_requested_when_sas_fails() {
    let f = fixture(true);

    let err = deploy(&f.stack, &f.deriver, &config(StackConfig::web()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataPlaneFailed);

    let kinds: Vec<_> = f.engine.requests().into_iter().map(|r| r.kind).collect();
    assert!(kinds.contains(&BLOB.to_string()));
    assert!(!kinds.contains(&WEB_APP.to_string()));
}

#[tokio::test]
async fn test_outputs_json_masks_secrets() -> Result<()> {
    let f = fixture(false);

    let outputs = deploy(&f.stack, &f.deriver, &config(StackConfig::function())).await?;
    let json: serde_json::Value = serde_json::from_str(&outputs.to_json()?)?;

    assert_eq!(json[PRIMARY_STORAGE_KEY], REDACTED);
    assert!(json[ENDPOINT]
        .as_str()
        .unwrap()
        .ends_with("/api/HelloWorldFunction?name=Pulumi"));
    assert!(!outputs.to_json()?.contains("a2V5"));

    // The function app carries the connection string, so its request is secret.
    let app = f
        .engine
        .requests()
        .into_iter()
        .find(|r| r.kind == WEB_APP)
        .unwrap();
    assert!(app.secret);
    assert!(!format!("{app:?}").contains("a2V5"));
    Ok(())
}

#[tokio::test]
async fn test_app_outputs_keep_connection_string_secret() -> Result<()> {
    let f = fixture(false);

    let outputs = FunctionAppStack::new(config(StackConfig::function())).assemble(&f.stack, &f.deriver)?;
    f.stack.finish(outputs).await?;

    let app = f
        .stack
        .resources()
        .into_iter()
        .find(|r| r.kind() == WEB_APP)
        .unwrap();

    let site = app.output("siteConfig").resolve_with_secret().await?;
    assert!(site.value().contains(AZURE_WEB_JOBS_STORAGE));
    assert!(site.is_secret());
    assert!(!format!("{site:?}").contains("a2V5"));

    let host = app.output(DEFAULT_HOST_NAME).resolve_with_secret().await?;
    assert!(!host.is_secret());
    Ok(())
}
