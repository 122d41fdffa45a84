use idg_dataset::{
    build_vocabulary, save_data, save_feature, Caption, CaptionData, CaptionRecord, DatasetConfig,
    DatasetFile, Error, IdgDataset, ImageMean, ImageRecord, ImageSource, RandomAccessDataset,
    WordCounter, UNK,
};
use image::RgbImage;
use ndarray::ArrayD;
use std::path::Path;
use tempfile::TempDir;

const FILE_PATHS: [&str; 3] = [
    "train2014/COCO_train2014_0.png",
    "train2014/COCO_train2014_1.v2.png",
    "val2014/COCO_val2014_2.png",
];

/// Build a dataset directory with 3 images, where the last one has no captions.
fn build_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    // vocabulary
    let counter: WordCounter = ["a", "a", "dog", "dog", "cat", "cat", "runs", "runs"]
        .into_iter()
        .collect();
    let vocab = build_vocabulary(&counter, 1, None).unwrap();
    save_data(&vocab, root.join("vocab.pkl")).unwrap();

    // dataset tables
    let encode = |tokens: &[&str]| Caption::Ids(vocab.encode(tokens.iter()));
    let images: Vec<_> = FILE_PATHS
        .iter()
        .enumerate()
        .map(|(img_idx, file_path)| ImageRecord {
            file_path: file_path.to_string(),
            img_idx,
        })
        .collect();
    let captions = vec![
        CaptionRecord {
            caption_idx: 0,
            img_idx: 1,
            caption: encode(&["<SOS>", "a", "dog", "runs", "<EOS>"]),
        },
        CaptionRecord {
            caption_idx: 1,
            img_idx: 0,
            caption: encode(&["<SOS>", "a", "cat", "<EOS>"]),
        },
        CaptionRecord {
            caption_idx: 2,
            img_idx: 1,
            caption: encode(&["<SOS>", "a", "zebra", "flies", "<EOS>"]),
        },
    ];
    let dataset = DatasetFile { images, captions };
    save_data(&dataset, root.join("dataset.json")).unwrap();
    save_data(&dataset, root.join("dataset.pkl")).unwrap();

    // features and raw images
    for (img_idx, file_path) in FILE_PATHS.iter().enumerate() {
        let feature = ArrayD::from_elem(vec![2, 4], img_idx as f32 + 0.5);
        let feature_file = root
            .join("features")
            .join(Path::new(file_path).with_extension("npz"));
        save_feature(feature.view(), feature_file).unwrap();

        let image_file = root.join("images").join(file_path);
        std::fs::create_dir_all(image_file.parent().unwrap()).unwrap();
        let size = 8 + img_idx as u32;
        RgbImage::from_pixel(size, size, image::Rgb([img_idx as u8, 100, 200]))
            .save(&image_file)
            .unwrap();
    }

    dir
}

fn feature_config(root: &Path) -> DatasetConfig {
    DatasetConfig {
        feature_root: root.join("features"),
        image_root: root.join("images"),
        ..DatasetConfig::new(root.join("dataset.json"), root.join("vocab.pkl"))
    }
}

#[test]
fn get_matches_image_index_test() {
    let dir = build_fixture();
    let dataset = IdgDataset::new(&feature_config(dir.path())).unwrap();

    assert_eq!(dataset.len(), 3);
    assert!(matches!(
        dataset.image_source(),
        ImageSource::OnDemandFeature { .. }
    ));

    for index in 0..dataset.len() {
        let example = dataset.get(index).unwrap();
        let img_idx = dataset.image_of(index).unwrap();
        assert_eq!(example.caption_idx, index);
        assert_eq!(example.img_idx, img_idx);
        assert_eq!(example.img_idx, dataset.captions()[index].img_idx);
        assert_eq!(example.image.shape(), [2, 4]);
        assert!(example
            .image
            .iter()
            .all(|&value| value == img_idx as f32 + 0.5));
    }
}

#[test]
fn preload_equivalence_test() {
    let dir = build_fixture();
    let on_demand = IdgDataset::new(&feature_config(dir.path())).unwrap();
    let preloaded = IdgDataset::new(&DatasetConfig {
        preload_features: true,
        ..feature_config(dir.path())
    })
    .unwrap();

    match preloaded.image_source() {
        ImageSource::PreloadedFeature { features, .. } => assert_eq!(features.len(), 3),
        _ => panic!("expect preloaded features"),
    }

    for index in 0..on_demand.len() {
        assert_eq!(
            on_demand.get(index).unwrap(),
            preloaded.get(index).unwrap()
        );
    }
}

#[test]
fn pickle_dataset_test() {
    let dir = build_fixture();
    let root = dir.path();
    let from_json = IdgDataset::new(&feature_config(root)).unwrap();
    let from_pickle = IdgDataset::new(&DatasetConfig {
        dataset_path: root.join("dataset.pkl"),
        ..feature_config(root)
    })
    .unwrap();

    assert_eq!(from_json.captions(), from_pickle.captions());
    assert_eq!(from_json.images(), from_pickle.images());
}

#[test]
fn raw_image_test() {
    let dir = build_fixture();
    let dataset = IdgDataset::new(&DatasetConfig {
        raw_image: true,
        image_size: [4, 6],
        image_mean: ImageMean::Zero,
        ..feature_config(dir.path())
    })
    .unwrap();

    let example = dataset.get(1).unwrap();
    assert_eq!(example.img_idx, 0);
    assert_eq!(example.image.shape(), [3, 4, 6]);
    // B, G, R channel order
    assert!(example
        .image
        .index_axis(ndarray::Axis(0), 0)
        .iter()
        .all(|&value| (value - 200.0).abs() <= 1.0));
    assert!(example
        .image
        .index_axis(ndarray::Axis(0), 2)
        .iter()
        .all(|&value| value.abs() <= 1.0));
}

#[test]
fn caption_representation_test() {
    let dir = build_fixture();
    let dataset = IdgDataset::new(&feature_config(dir.path())).unwrap();
    let vocab = dataset.vocabulary();
    let id_of = |token: &str| vocab.id_of(token).unwrap() as i64;

    match dataset.get(0).unwrap().caption {
        CaptionData::Ids(ids) => {
            assert_eq!(ids.to_vec(), [1, id_of("a"), id_of("dog"), id_of("runs"), 2])
        }
        CaptionData::Raw(_) => panic!("expect caption ids"),
    }

    let dataset = IdgDataset::new(&DatasetConfig {
        raw_caption: true,
        ..feature_config(dir.path())
    })
    .unwrap();
    assert_eq!(
        dataset.get(0).unwrap().caption,
        CaptionData::Raw(dataset.captions()[0].caption.clone())
    );
}

#[test]
fn get_raw_test() {
    let dir = build_fixture();
    let dataset = IdgDataset::new(&feature_config(dir.path())).unwrap();

    let (path, tokens) = dataset.get_raw(2).unwrap();
    assert_eq!(path, dir.path().join("images").join(FILE_PATHS[1]));
    assert_eq!(tokens, ["<SOS>", "a", UNK, UNK, "<EOS>"]);

    let dataset = IdgDataset::new(&DatasetConfig {
        image_root: "".into(),
        ..feature_config(dir.path())
    })
    .unwrap();
    assert!(matches!(
        dataset.get_raw(0),
        Err(Error::Configuration { .. })
    ));
}

#[test]
fn vocabulary_round_trip_test() {
    let dir = build_fixture();
    let dataset = IdgDataset::new(&feature_config(dir.path())).unwrap();

    for record in dataset.captions() {
        let ids = match &record.caption {
            Caption::Ids(ids) => ids.clone(),
            Caption::Tokens(_) => panic!("expect encoded captions"),
        };
        let tokens = dataset.decode_ids(ids.iter().copied()).unwrap();
        assert_eq!(dataset.encode_tokens(&tokens), ids);
    }

    for (token, _) in dataset.vocabulary().iter() {
        let ids = dataset.encode_tokens([token]);
        assert_eq!(dataset.decode_ids(ids).unwrap(), [token]);
    }

    let ids = dataset.encode_tokens(["zebra"]);
    assert_eq!(dataset.decode_ids(ids).unwrap(), [UNK]);

    let err = dataset.decode_ids([1, 999]).unwrap_err();
    assert!(err.is_unknown_id());
}

#[test]
fn summary_test() {
    let dir = build_fixture();
    let dataset = IdgDataset::new(&feature_config(dir.path())).unwrap();
    let summary = dataset.summary();

    assert_eq!(summary.vocabulary_size, 7);
    assert_eq!(summary.caption_count, 3);
    assert_eq!(summary.image_count, 3);
    // 2 unknown tokens out of 14
    assert_eq!(summary.unknown_token_ratio, 0.143);
    assert_eq!(
        dataset.unknown_token_ratio(&dataset.captions()[..2]),
        0.0
    );
}

#[test]
fn iterate_test() {
    let dir = build_fixture();
    let dataset = IdgDataset::new(&feature_config(dir.path())).unwrap();

    let img_indices: Vec<_> = dataset
        .iter()
        .map(|example| example.unwrap().img_idx)
        .collect();
    assert_eq!(img_indices, [1, 0, 1]);
    assert_eq!(dataset.iter().len(), 3);
}

#[test]
fn index_out_of_range_test() {
    let dir = build_fixture();
    let dataset = IdgDataset::new(&feature_config(dir.path())).unwrap();

    assert!(matches!(
        dataset.get(3),
        Err(Error::IndexOutOfRange { index: 3, len: 3 })
    ));
    assert!(matches!(
        dataset.get_raw(10),
        Err(Error::IndexOutOfRange { .. })
    ));
    assert!(dataset.get(2).is_ok());
}

#[test]
fn missing_roots_test() {
    let dir = build_fixture();
    let config = DatasetConfig::new(
        dir.path().join("dataset.json"),
        dir.path().join("vocab.pkl"),
    );

    match IdgDataset::new(&config) {
        Err(Error::Configuration { reason }) => assert!(reason.contains("feature_root")),
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }

    match IdgDataset::new(&DatasetConfig {
        raw_image: true,
        ..config.clone()
    }) {
        Err(Error::Configuration { reason }) => assert!(reason.contains("image_root")),
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }

    assert!(matches!(
        IdgDataset::new(&DatasetConfig {
            raw_image: true,
            image_root: dir.path().join("no_images"),
            ..config.clone()
        }),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        IdgDataset::new(&DatasetConfig {
            feature_root: dir.path().join("no_features"),
            ..config
        }),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn missing_files_test() {
    let dir = build_fixture();
    let root = dir.path();

    assert!(matches!(
        IdgDataset::new(&DatasetConfig {
            dataset_path: root.join("missing.json"),
            ..feature_config(root)
        }),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        IdgDataset::new(&DatasetConfig {
            vocab_path: root.join("missing.pkl"),
            ..feature_config(root)
        }),
        Err(Error::NotFound { .. })
    ));

    std::fs::copy(root.join("dataset.json"), root.join("dataset.yaml")).unwrap();
    assert!(matches!(
        IdgDataset::new(&DatasetConfig {
            dataset_path: root.join("dataset.yaml"),
            ..feature_config(root)
        }),
        Err(Error::UnsupportedFormat { .. })
    ));

    std::fs::remove_file(root.join("features/val2014/COCO_val2014_2.npz")).unwrap();
    assert!(IdgDataset::new(&feature_config(root)).is_ok());
    assert!(matches!(
        IdgDataset::new(&DatasetConfig {
            preload_features: true,
            ..feature_config(root)
        }),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn dangling_image_index_test() {
    let dir = build_fixture();
    let root = dir.path();
    let dataset = DatasetFile {
        images: vec![ImageRecord {
            file_path: FILE_PATHS[0].into(),
            img_idx: 0,
        }],
        captions: vec![CaptionRecord {
            caption_idx: 0,
            img_idx: 1,
            caption: Caption::Ids(vec![1, 2]),
        }],
    };
    save_data(&dataset, root.join("broken.json")).unwrap();

    assert!(matches!(
        IdgDataset::new(&DatasetConfig {
            dataset_path: root.join("broken.json"),
            ..feature_config(root)
        }),
        Err(Error::Lookup { .. })
    ));
}
