use filmdb_core::config::Settings;
use filmdb_core::traits::Embedder;
use filmdb_embed::embedder_from_settings;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let embedder = embedder_from_settings(&settings.embedding)?;
    let texts = vec!["a heist crew in los angeles".to_string(), "astronauts lost in space".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}
