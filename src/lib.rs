pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod export;
pub mod extract;
pub mod ir;
pub mod order;
pub mod reconcile;
pub mod report;
pub mod resolve;
pub mod tree;

use serde_json::Value;
use tracing::info;
use wasm_bindgen::prelude::*;

use config::{ConfigError, Options};
use diagnostics::{Diagnostic, Diagnostics};
use extract::ExtractError;
use ir::SchemaModel;
use resolve::{OwnerPolicy, Resolver};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result of one run: the schema plus everything that was dropped or
/// defaulted on the way.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub schema: SchemaModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run extraction, foreign-key placement, reconciliation and ordering over a
/// parsed export.
pub fn resolve_value(
    root: &Value,
    options: &Options,
    policy: &mut dyn OwnerPolicy,
) -> Result<Resolution, ExtractError> {
    let mut diagnostics = Diagnostics::new();

    let extracted = extract::extract(root, options, &mut diagnostics)?;
    let resolved = Resolver::new(policy).resolve(&extracted, &mut diagnostics);
    let reconciled = reconcile::reconcile(resolved);
    let schema = order::order(reconciled, &mut diagnostics);

    info!(
        namespaces = schema.namespaces.len(),
        tables = schema.tables().count(),
        diagnostics = diagnostics.len(),
        "schema resolved"
    );

    Ok(Resolution {
        schema,
        diagnostics: diagnostics.into_vec(),
    })
}

/// Parse and resolve an export, using the one-to-one policy named in the
/// options.
pub fn resolve_str(source: &str, options: &Options) -> Result<Resolution, Error> {
    options.validate()?;
    let root: Value = serde_json::from_str(source)?;
    let mut policy = options.one_to_one.policy();
    Ok(resolve_value(&root, options, policy.as_mut())?)
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Resolve an `.mdj` export to the JSON schema layout
#[wasm_bindgen(js_name = "mdjToSchema")]
pub fn mdj_to_schema(source: &str, options: Option<String>) -> Result<String, String> {
    let options = match options.as_deref() {
        Some(json) => Options::from_json(json).map_err(|e| e.to_string())?,
        None => Options::default(),
    };
    let resolution = resolve_str(source, &options).map_err(|e| e.to_string())?;

    Ok(export::to_json_string(&resolution.schema, &resolution.diagnostics))
}
