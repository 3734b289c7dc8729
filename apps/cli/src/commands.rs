use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use app_settings::MediaSettings;
use core_types::CropRect;
use engine::{CropConfig, CropListener, CropTracker, DisplayRect, SourceSelector, SourceSize};
use media_store::Ingestor;
use serde_json::{json, Value};

fn ingestor(settings: &MediaSettings) -> Result<Ingestor> {
    let root = settings
        .storage_root()
        .context("Failed to determine storage root")?;
    Ok(Ingestor::new(root))
}

pub async fn select(file: &Path, content_type: Option<&str>) -> Result<Value> {
    let source = SourceSelector::new()
        .select(file, content_type)
        .await
        .with_context(|| format!("Failed to select {}", file.display()))?;
    Ok(json!({
        "content_type": source.content_type,
        "dimensions": source.dimensions,
        "data_uri": source.data_uri,
    }))
}

pub async fn save(
    settings: &MediaSettings,
    category: &str,
    file: &Path,
    content_type: Option<&str>,
) -> Result<Value> {
    let source = SourceSelector::new()
        .select(file, content_type)
        .await
        .with_context(|| format!("Failed to select {}", file.display()))?;
    let stored = ingestor(settings)?
        .store()
        .store(category, &source.data_uri)
        .with_context(|| format!("Failed to store {} under {category}", file.display()))?;
    Ok(serde_json::to_value(stored)?)
}

pub fn process(settings: &MediaSettings, category: &str, value: &str) -> Result<Value> {
    let processed = ingestor(settings)?
        .process(category, Some(value))
        .with_context(|| format!("Failed to process value for {category}"))?;
    Ok(json!({ "value": processed }))
}

pub fn delete(settings: &MediaSettings, category: &str, reference: &str) -> Result<Value> {
    ingestor(settings)?
        .delete(category, reference)
        .with_context(|| format!("Failed to delete {reference}"))?;
    Ok(json!({ "deleted": reference }))
}

/// Replays a single terminal crop event over `file`.
pub async fn crop(
    settings: &MediaSettings,
    file: &Path,
    (x, y, size): (f64, f64, f64),
    display: Option<(f64, f64)>,
) -> Result<Value> {
    let source = SourceSelector::new()
        .select(file, None)
        .await
        .with_context(|| format!("Failed to select {}", file.display()))?;
    let (width, height) = source
        .dimensions
        .ok_or_else(|| anyhow!("Unable to read dimensions of {}", file.display()))?;

    let committed: Arc<Mutex<Option<CropRect>>> = Arc::default();
    let sink = Arc::clone(&committed);
    let listener: CropListener = Arc::new(move |rect| {
        *sink.lock().expect("crop sink poisoned") = rect;
    });
    let config = CropConfig {
        debounce: settings.crop.debounce(),
        aspect: settings.crop.aspect,
    };

    let tracker = CropTracker::new(config, listener);
    tracker.load_source(SourceSize::new(width, height), display);
    tracker.drag_end(DisplayRect::new(x, y, size, size));

    let rect = *committed.lock().expect("crop sink poisoned");
    Ok(json!({
        "source": { "width": width, "height": height },
        "crop": rect,
    }))
}
