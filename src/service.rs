//! ActionService: transport-agnostic init/run lifecycle.
//!
//! One action is bound per container lifetime: `init` materializes the
//! submitted source and persists the binding, `run` re-reads the binding
//! and invokes the entry point. The hosting layer delivers one request at
//! a time; the activation lock keeps stdout framing coherent even if that
//! guarantee is ever violated.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::ActivationError;
use crate::loader::{self, ActionLayout, ENTRY_SOURCE_FILENAME, InitPayload};
use crate::runtime;
use crate::store::{ActionStore, BoundAction};

pub struct ActionService {
    layout: ActionLayout,
    store: ActionStore,
    activation_lock: tokio::sync::Mutex<()>,
}

impl ActionService {
    /// Create a service rooted at the container's action directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let layout = ActionLayout::new(root);
        let store = ActionStore::new(layout.config_file.clone());
        Self {
            layout,
            store,
            activation_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Bind an action: write its source (if any) and persist its metadata.
    ///
    /// Metadata is persisted even when no code is supplied, so a repeated
    /// init can re-configure the entry point without resubmitting source.
    pub fn init(&self, payload: &InitPayload) -> Result<(), ActivationError> {
        loader::materialize(&self.layout, payload)?;
        self.store.save(&BoundAction {
            name: payload.name.clone(),
            entry_point: payload.entry_point.clone(),
        })?;
        tracing::info!(
            action = %payload.name,
            entry_point = %payload.entry_point,
            code = payload.code.is_some(),
            binary = payload.binary,
            "action bound"
        );
        Ok(())
    }

    /// Execute one activation of the bound action.
    ///
    /// The entry-point call is blocking from the host's perspective and
    /// runs on a blocking worker thread.
    pub async fn run(
        &self,
        args: Map<String, Value>,
    ) -> Result<Map<String, Value>, ActivationError> {
        let _activation = self.activation_lock.lock().await;

        let layout = self.layout.clone();
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            if !layout.entry_file.exists() {
                tracing::error!(file = %layout.entry_file.display(), "no action file");
                return Err(ActivationError::MissingAction(
                    ENTRY_SOURCE_FILENAME.to_string(),
                ));
            }
            let action = store.load()?;
            tracing::debug!(action = %action.name, entry_point = %action.entry_point, "invoking");
            runtime::invoke(&layout, &action, args)
        })
        .await
        .map_err(|e| ActivationError::Internal(format!("activation task failed: {e}")))?
    }

    pub fn layout(&self) -> &ActionLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_in(dir: &tempfile::TempDir) -> ActionService {
        ActionService::new(dir.path())
    }

    fn inline_init(code: &str, entry_point: &str) -> InitPayload {
        InitPayload {
            name: "test/action".to_string(),
            entry_point: entry_point.to_string(),
            code: Some(code.to_string()),
            binary: false,
        }
    }

    #[tokio::test]
    async fn init_then_run_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        service
            .init(&inline_init(
                "function handler(args) return { got = args.k } end",
                "handler",
            ))
            .unwrap();

        let mut args = Map::new();
        args.insert("k".to_string(), json!(1));
        let result = service.run(args).await.unwrap();
        assert_eq!(Value::Object(result), json!({"got": 1}));
    }

    #[tokio::test]
    async fn run_before_init_is_a_missing_action() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        let err = service.run(Map::new()).await.unwrap_err();
        assert!(matches!(err, ActivationError::MissingAction(_)));
    }

    #[tokio::test]
    async fn run_with_source_but_no_config_is_config_missing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        // Source present without a persisted binding (config removed after
        // a successful init).
        service
            .init(&inline_init("function main(args) return {} end", "main"))
            .unwrap();
        std::fs::remove_file(&service.layout().config_file).unwrap();

        let err = service.run(Map::new()).await.unwrap_err();
        assert!(matches!(err, ActivationError::ConfigMissing(_)));
    }

    #[tokio::test]
    async fn metadata_only_init_rebinds_the_entry_point() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        service
            .init(&inline_init(
                "function first(args) return {which = 'first'} end \
                 function second(args) return {which = 'second'} end",
                "first",
            ))
            .unwrap();

        // No code this time; only the entry point changes.
        service
            .init(&InitPayload {
                name: "test/action".to_string(),
                entry_point: "second".to_string(),
                code: None,
                binary: false,
            })
            .unwrap();

        let result = service.run(Map::new()).await.unwrap();
        assert_eq!(Value::Object(result), json!({"which": "second"}));
    }

    #[tokio::test]
    async fn repeated_runs_reuse_the_same_binding() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        service
            .init(&inline_init(
                "function main(args) return { n = args.n } end",
                "main",
            ))
            .unwrap();

        for n in 0..3 {
            let mut args = Map::new();
            args.insert("n".to_string(), json!(n));
            let result = service.run(args).await.unwrap();
            assert_eq!(Value::Object(result), json!({"n": n}));
        }
    }
}
