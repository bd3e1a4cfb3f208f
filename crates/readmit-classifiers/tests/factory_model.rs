use ndarray::Array2;
use readmit_classifiers::config::ModelType;
use readmit_classifiers::models::{factory, ClassifierModel};

fn tiny_dataset() -> (Array2<f32>, Vec<u8>) {
    let x = Array2::from_shape_vec(
        (8, 2),
        vec![
            1.0, 0.0, // readmitted
            0.0, 1.0, // not readmitted
            1.0, 0.1, // readmitted
            0.0, 0.9, // not readmitted
            1.1, 0.0, // readmitted
            0.0, 1.2, // not readmitted
            0.9, 0.2, // readmitted
            0.1, 1.1, // not readmitted
        ],
    )
    .expect("failed to create feature matrix");
    let y = vec![1u8, 0, 1, 0, 1, 0, 1, 0];
    (x, y)
}

#[test]
fn test_factory_builds_and_predicts() {
    let (x, y) = tiny_dataset();

    for params in [
        ModelType::BaggedTrees {
            n_estimators: 5,
            max_depth: Some(3),
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        },
        ModelType::BoostedTrees {
            learning_rate: 0.1,
            max_depth: 3,
            num_boost_round: 3,
            min_leaf_size: 1,
            debug: false,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
        },
    ] {
        let mut model = factory::build_model(&params);
        assert_eq!(model.name(), params.name());
        model.fit(&x, &y).expect("fit failed");
        let probs = model.predict_proba(&x).expect("predict failed");
        assert_eq!(probs.len(), x.nrows());
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

#[test]
fn fitted_model_survives_json_roundtrip() {
    let (x, y) = tiny_dataset();
    let mut model = factory::build_model(&ModelType::BoostedTrees {
        learning_rate: 0.1,
        max_depth: 3,
        num_boost_round: 5,
        min_leaf_size: 1,
        debug: false,
        training_optimization_level: 2,
        loss_type: "LogLikelyhood".to_string(),
    });
    model.fit(&x, &y).unwrap();

    let json = serde_json::to_string(&model).unwrap();
    let restored: factory::Classifier = serde_json::from_str(&json).unwrap();
    assert!(restored.is_fitted());
    assert_eq!(
        model.predict_proba(&x).unwrap(),
        restored.predict_proba(&x).unwrap()
    );
}
