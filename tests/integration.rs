//! Integration tests for the rulelist library.
//!
//! These tests verify end-to-end workflows combining mining, rule selection
//! and evaluation.

use rulelist::metrics::Average;
use rulelist::prelude::*;

/// a1 = 1, a2 = 2, b1 = 3, b2 = 4; X = 10, Y = 11.
fn four_instances() -> Dataset {
    Dataset::from_rows(&[
        vec![1, 3, 10],
        vec![1, 4, 10],
        vec![2, 3, 11],
        vec![2, 4, 11],
    ])
    .expect("valid rows")
}

/// Three attributes; the class is decided by the first one alone.
fn first_attribute_decides() -> Dataset {
    let mut rows = Vec::new();
    for _ in 0..2 {
        for a in 1..=3 {
            for b in 4..=5 {
                for c in 6..=7 {
                    rows.push(vec![a, b, c, 9 + a]);
                }
            }
        }
    }
    Dataset::from_rows(&rows).expect("valid rows")
}

#[test]
fn test_mined_rules_precede_weaker_rules() {
    let dataset = four_instances();
    let mut rules = ClassApriori::new()
        .with_min_support(0.25)
        .with_min_confidence(0.5)
        .mine(&dataset)
        .expect("valid thresholds");
    rulelist::rules::precedence::sort(&mut rules);

    let a1_x = rules
        .iter()
        .position(|r| r.antecedent() == [1] && r.class() == 10)
        .expect("{a1} => X is mined");
    let a2_y = rules
        .iter()
        .position(|r| r.antecedent() == [2] && r.class() == 11)
        .expect("{a2} => Y is mined");

    assert_eq!(rules[a1_x].confidence(), 1.0);
    assert_eq!(rules[a2_y].confidence(), 1.0);
    for (i, rule) in rules.iter().enumerate() {
        if rule.confidence() < 1.0 {
            assert!(i > a1_x && i > a2_y, "{rule} outranks a perfect rule");
        }
    }
}

#[test]
fn test_end_to_end_classifier() {
    let dataset = four_instances();
    let classifier = train(&dataset, 0.25, 0.5).expect("valid input");

    let text = classifier.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("1 ==> 10 "));
    assert_eq!(lines[1], "DEFAULT ==> 11");

    for instance in dataset.instances() {
        assert_eq!(classifier.predict(instance), instance.class());
    }
}

#[test]
fn test_removing_a_class_leaves_default_rule() {
    let dataset = four_instances();
    let only_x: Vec<Instance> = dataset
        .instances()
        .iter()
        .filter(|i| i.class() == 10)
        .cloned()
        .collect();
    let classifier = train(&Dataset::new(only_x), 0.25, 0.5).expect("valid input");

    assert_eq!(classifier.n_rules(), 1);
    assert_eq!(classifier.default_class(), 10);
    assert!(classifier.rules()[0].is_empty());
}

#[test]
fn test_single_attribute_concept_is_learned() {
    let dataset = first_attribute_decides();
    let mut model = Cba::new()
        .with_min_support(0.05)
        .with_min_confidence(0.6);
    model.fit(&dataset).expect("valid input");

    let classifier = model.classifier().expect("fitted");
    assert_eq!(classifier.score(&dataset), 1.0);
    assert_eq!(classifier.training_errors(), Some(0));
    assert_eq!(classifier.n_rules(), 3);
    assert!(classifier.rules().iter().all(|r| r.len() <= 1));

    let matrix = ConfusionMatrix::evaluate(classifier, &dataset);
    assert_eq!(matrix.f1_score(Average::Macro), 1.0);
}

#[test]
fn test_declared_class_order_breaks_ties() {
    let instances = vec![
        Instance::new(vec![1], 20),
        Instance::new(vec![2], 30),
    ];
    let declared = Dataset::with_classes(instances.clone(), vec![30, 20]).expect("declared");
    let classifier = build_classifier::<()>(&declared, Vec::new()).expect("has classes");
    assert_eq!(classifier.default_class(), 30);

    let appearance = Dataset::new(instances);
    let classifier = build_classifier::<()>(&appearance, Vec::new()).expect("has classes");
    assert_eq!(classifier.default_class(), 20);
}

/// Emits one rule per (item, class) pair that occurs at least once.
struct SingleItems;

impl RuleSource for SingleItems {
    type Stats = ();

    fn mine(&self, dataset: &Dataset) -> Result<Vec<Rule>> {
        let mut rules: Vec<Rule> = Vec::new();
        for instance in dataset.instances() {
            for &item in instance.items() {
                let mut rule = Rule::new(vec![item], instance.class());
                if !rules.contains(&rule) {
                    rule.evaluate(dataset);
                    rules.push(rule);
                }
            }
        }
        Ok(rules)
    }
}

#[test]
fn test_custom_rule_source() {
    let dataset = four_instances();
    let pool = SingleItems.mine(&dataset).expect("infallible");
    assert_eq!(pool.len(), 6);

    let classifier = build_classifier(&dataset, pool).expect("has classes");
    assert_eq!(classifier.score(&dataset), 1.0);
    assert_eq!(classifier.default_class(), 11);
}

#[test]
fn test_classifier_json_round_trip() {
    let dataset = first_attribute_decides();
    let classifier = train(&dataset, 0.05, 0.6).expect("valid input");

    let json = serde_json::to_string(&classifier).expect("serializable");
    let restored: CbaClassifier = serde_json::from_str(&json).expect("deserializable");

    assert_eq!(restored.n_rules(), classifier.n_rules());
    assert_eq!(restored.default_class(), classifier.default_class());
    for (a, b) in restored.rules().iter().zip(classifier.rules()) {
        assert_eq!(a, b);
        assert_eq!(a.support_rule(), b.support_rule());
        assert_eq!(a.ordinal(), b.ordinal());
    }
    assert_eq!(
        restored.predict_batch(&dataset),
        classifier.predict_batch(&dataset)
    );
}

#[test]
fn test_estimator_json_round_trip() {
    let mut model = Cba::new()
        .with_min_support(0.25)
        .with_support_mode(SupportMode::PerClass);
    model.fit(&four_instances()).expect("valid input");

    let json = serde_json::to_string(&model).expect("serializable");
    let restored: Cba = serde_json::from_str(&json).expect("deserializable");

    assert_eq!(restored.miner(), model.miner());
    let probe = Instance::new(vec![2, 3], 0);
    assert_eq!(restored.predict(&probe), model.predict(&probe));
}

#[test]
fn test_errors_are_reported() {
    let err = train(&four_instances(), 1.5, 0.5).expect_err("min_support > 1");
    assert!(err.to_string().contains("min_support"));

    let err = Cba::new()
        .predict(&Instance::new(vec![1], 0))
        .expect_err("not fitted");
    assert_eq!(err, RuleListError::NotFitted);
}
