use candle_core::{DType, Device, Tensor};
use filmdb_core::config::{EmbeddingBackend, EmbeddingSettings};
use filmdb_core::traits::Embedder;
use filmdb_embed::{embedder_from_settings, masked_mean_l2, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(1024);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1024);
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_tokens_raise_similarity() {
    let embedder = HashEmbedder::new(256);
    let space = embedder.embed("astronauts drift through deep space").unwrap();
    let near = embedder.embed("deep space astronauts").unwrap();
    let far = embedder.embed("a baker opens a small bakery").unwrap();
    assert!(cosine(&space, &near) > cosine(&space, &far));
}

#[test]
fn blank_text_is_the_zero_vector() {
    let v = HashEmbedder::new(8).embed("  ").unwrap();
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn settings_select_hash_backend() {
    let settings = EmbeddingSettings { backend: EmbeddingBackend::Hash, dimension: 64, ..EmbeddingSettings::default() };
    let embedder = embedder_from_settings(&settings).expect("embedder");
    assert_eq!(embedder.dim(), 64);
    assert_eq!(embedder.embed("heist").unwrap().len(), 64);
}

#[test]
fn masked_mean_l2_ignores_padding() {
    let dev = Device::Cpu;
    // batch of two, two tokens each, hidden dim 4; second token of row 0 is padding
    let h = Tensor::from_slice(
        &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
        (2, 2, 4),
        &dev,
    )
    .unwrap();
    let mask = Tensor::from_slice(&[1u32, 0, 1, 1], (2, 2), &dev).unwrap().to_dtype(DType::F32).unwrap();
    let out: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).unwrap().to_vec2().unwrap();

    let norm = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
    let expected = [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm];
    for (a, b) in out[0].iter().cloned().zip(expected) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
    assert!((out[1][0] - 1.0).abs() < 1e-5);
}

#[test]
fn masked_mean_l2_rejects_wrong_rank() {
    let dev = Device::Cpu;
    let flat = Tensor::zeros((2, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((2, 4), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&flat, &mask).is_err());
}
