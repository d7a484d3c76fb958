use std::{fs, path::PathBuf};

use clap::Parser;
use silver_jewelry_api::openapi::ApiDoc;
use utoipa::OpenApi;

/// Writes the OpenAPI document to disk
#[derive(Parser, Debug)]
#[command(name = "openapi-export")]
struct Args {
    /// Output directory
    #[arg(long, default_value = "openapi")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;

    fs::create_dir_all(&args.out_dir)?;
    let output_path = args.out_dir.join("silver-jewelry-api.json");
    fs::write(&output_path, json)?;

    println!("OpenAPI spec written to {}", output_path.display());
    Ok(())
}
