use filmdb_core::error::Error;
use filmdb_core::store::RecordStore;
use filmdb_core::types::Record;
use filmdb_embed::HashEmbedder;
use filmdb_vector::{build_flat_index, load_flat_index, save_flat_index};

fn catalog(n: u64) -> RecordStore {
    let records = (0..n)
        .map(|i| Record { id: 1000 - i, title: format!("Film {i}"), overview: format!("story number {i} about harbor {}", i % 7), ..Record::default() })
        .collect();
    RecordStore::new(records).expect("store")
}

#[tokio::test]
async fn lancedb_round_trip_keeps_rows_and_order() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = catalog(1500);
    let embedder = HashEmbedder::new(32);
    let flat = build_flat_index(&store, &embedder, 64)?;

    save_flat_index(&flat, tmp.path(), "movies").await?;
    let loaded = load_flat_index(tmp.path(), "movies").await?;

    assert_eq!(loaded.len(), 1500);
    assert_eq!(loaded.dim(), 32);
    assert_eq!(loaded.ids(), flat.ids());
    for row in [0, 999, 1000, 1499] {
        let (a, b) = (flat.vector(row).unwrap(), loaded.vector(row).unwrap());
        assert!(a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6));
    }

    // a second save replaces the table rather than appending to it
    save_flat_index(&flat, tmp.path(), "movies").await?;
    assert_eq!(load_flat_index(tmp.path(), "movies").await?.len(), 1500);
    Ok(())
}

#[tokio::test]
async fn missing_table_is_unavailable() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = catalog(3);
    let flat = build_flat_index(&store, &HashEmbedder::new(8), 2)?;
    save_flat_index(&flat, tmp.path(), "movies").await?;

    let err = load_flat_index(tmp.path(), "series").await.unwrap_err();
    assert!(matches!(err, Error::IndexUnavailable(_)));
    let err = load_flat_index(&tmp.path().join("nowhere"), "movies").await.unwrap_err();
    assert!(matches!(err, Error::IndexUnavailable(_)));
    Ok(())
}
