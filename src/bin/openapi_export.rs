use std::{env, fs, path::PathBuf};

use stockroom_api::openapi::ApiDocV1;
use utoipa::OpenApi;

/// Writes the OpenAPI document to `openapi/stockroom-api.v1.json`, or to the
/// directory given as the first argument.
fn main() -> anyhow::Result<()> {
    let openapi = ApiDocV1::openapi();
    let json = serde_json::to_string_pretty(&openapi)?;

    let output_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi"));
    fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join("stockroom-api.v1.json");
    fs::write(&output_path, json)?;

    println!("OpenAPI spec written to {}", output_path.display());
    Ok(())
}
