use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use datagen_generate::{GenerateOptions, GenerationEngine, OutputFormat, SchemaMap, write_dataset};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut schema_path: Option<PathBuf> = None;
    let mut out_dir = PathBuf::from("out");
    let mut format = OutputFormat::Json;
    let mut counts = BTreeMap::new();
    let mut options = GenerateOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schemas" => schema_path = args.next().map(PathBuf::from),
            "--out" => out_dir = args.next().map(PathBuf::from).ok_or("missing --out value")?,
            "--format" => format = args.next().ok_or("missing --format value")?.parse()?,
            "--seed" => options.seed = Some(args.next().ok_or("missing --seed value")?.parse()?),
            "--count" => {
                let entry = args.next().ok_or("missing --count value")?;
                let (table, count) = entry.split_once('=').ok_or("expected TABLE=N")?;
                counts.insert(table.to_string(), count.parse::<u64>()?);
            }
            _ => return Err(format!("unexpected argument '{arg}'").into()),
        }
    }

    let schema_path = schema_path.ok_or("missing --schemas path")?;
    let schemas: SchemaMap = serde_json::from_str(&std::fs::read_to_string(&schema_path)?)?;
    if counts.is_empty() {
        counts = schemas.keys().map(|table| (table.clone(), 10)).collect();
    }

    let engine = GenerationEngine::new(options);
    let result = engine.generate(&schemas, &counts)?;
    for file in write_dataset(&out_dir, format, &result)? {
        println!("{} ({} bytes)", file.path.display(), file.bytes);
    }
    Ok(())
}
