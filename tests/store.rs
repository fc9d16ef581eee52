mod common;

use std::fs;

use common::built_index;
use vismatch::config::{EMBEDDING_DIM, ENCODER_TAG};
use vismatch::storage::{self, Encoding};
use vismatch::MatchError;

#[test]
fn messagepack_round_trip_is_exact() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("catalog.msgpack");
	let (index, _) = built_index(10);

	storage::save(&path, &index).unwrap();
	let loaded = storage::load(&path, ENCODER_TAG, EMBEDDING_DIM).unwrap();

	assert_eq!(loaded.fingerprint(), index.fingerprint());
	assert_eq!(loaded.built_at(), index.built_at());
	let ids: Vec<u64> = loaded.iter().map(|e| e.product.id).collect();
	assert_eq!(ids, (1..=10).collect::<Vec<_>>());
	assert_eq!(loaded.get(4).unwrap().product, index.get(4).unwrap().product);
}

#[test]
fn json_round_trip_keeps_order_and_vectors() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("catalog.json");
	let (index, _) = built_index(5);

	storage::save(&path, &index).unwrap();
	let text = fs::read_to_string(&path).unwrap();
	assert!(text.contains(ENCODER_TAG));

	let loaded = storage::load(&path, ENCODER_TAG, EMBEDDING_DIM).unwrap();
	assert_eq!(loaded.len(), 5);
	for (a, b) in loaded.iter().zip(index.iter()) {
		assert_eq!(a.product.id, b.product.id);
		assert!(a.embedding.as_slice().iter().zip(b.embedding.as_slice()).all(|(x, y)| (x - y).abs() < 1e-6));
	}
}

#[test]
fn extension_picks_encoding() {
	assert_eq!(Encoding::for_path("a/catalog.json".as_ref()), Encoding::Json);
	assert_eq!(Encoding::for_path("a/catalog.JSON".as_ref()), Encoding::Json);
	assert_eq!(Encoding::for_path("a/catalog.msgpack".as_ref()), Encoding::MessagePack);
	assert_eq!(Encoding::for_path("a/catalog".as_ref()), Encoding::MessagePack);
}

#[test]
fn save_leaves_no_temp_files() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("catalog.msgpack");
	let (index, _) = built_index(2);

	storage::save(&path, &index).unwrap();
	storage::save(&path, &index).unwrap();

	let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
	assert_eq!(names.len(), 1);
}

#[test]
fn other_encoder_is_refused() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("catalog.msgpack");
	let (index, _) = built_index(2);
	storage::save(&path, &index).unwrap();

	let err = storage::load(&path, "siglip2-base/256/r1", EMBEDDING_DIM).unwrap_err();
	assert!(matches!(err, MatchError::StoreLoad { .. }));

	let err = storage::load(&path, ENCODER_TAG, 768).unwrap_err();
	assert!(matches!(err, MatchError::StoreLoad { .. }));
}

#[test]
fn missing_and_corrupt_stores_fail_to_load() {
	let dir = tempfile::tempdir().unwrap();

	let missing = dir.path().join("nope.msgpack");
	let err = storage::load(&missing, ENCODER_TAG, EMBEDDING_DIM).unwrap_err();
	assert!(matches!(err, MatchError::StoreLoad { ref path, .. } if path == &missing));

	let corrupt = dir.path().join("corrupt.json");
	fs::write(&corrupt, "{\"format\": 1, \"entries\": [").unwrap();
	let err = storage::load(&corrupt, ENCODER_TAG, EMBEDDING_DIM).unwrap_err();
	assert!(matches!(err, MatchError::StoreLoad { .. }));
}

#[test]
fn denormalized_vector_is_rejected() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("catalog.json");
	let (index, _) = built_index(1);
	storage::save(&path, &index).unwrap();

	let mut doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
	let values = doc["entries"][0]["embedding"].as_array_mut().unwrap();
	for v in values.iter_mut() {
		*v = serde_json::json!(v.as_f64().unwrap() * 2.0);
	}
	fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

	let err = storage::load(&path, ENCODER_TAG, EMBEDDING_DIM).unwrap_err();
	assert!(matches!(err, MatchError::StoreLoad { .. }));
}

#[test]
fn concurrent_saves_to_one_target_stay_loadable() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("catalog.msgpack");
	let (small, _) = built_index(3);
	let (large, _) = built_index(12);

	std::thread::scope(|scope| {
		for i in 0..8 {
			let (path, index) = (&path, if i % 2 == 0 { &small } else { &large });
			scope.spawn(move || storage::save(path, index).unwrap());
		}
	});

	let loaded = storage::load(&path, ENCODER_TAG, EMBEDDING_DIM).unwrap();
	assert!(loaded.fingerprint() == small.fingerprint() || loaded.fingerprint() == large.fingerprint());
	let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
	assert_eq!(names.len(), 1);
}
