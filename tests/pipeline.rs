use std::fs;
use std::path::Path;

use taxonomy_classifier::{
    construct, init, BowCorpus, CategoryPartition, Classifier, ClassifierError, ClassifierState, ConstructConfig,
    InitConfig, LoadConfig,
};

const SPORTS: &[&str] = &[
    "basketball game tonight at the arena",
    "basketball playoffs scores and highlights",
    "soccer match tonight at the stadium",
    "tennis tournament final scores",
    "basketball coach post game interview",
    "baseball pitcher throws a perfect game",
];

const COOKING: &[&str] = &[
    "pasta recipe with garlic and basil",
    "baking sourdough bread at home",
    "garlic butter sauce recipe",
    "slow cooker dinner recipe ideas",
    "bread dough kneading tips",
    "roasted vegetables in the oven",
];

fn write_taxonomy(path: &Path) {
    let mut src = String::from("# test taxonomy\nTop\n");
    for (i, text) in SPORTS.iter().enumerate() {
        src.push_str(&format!("Top/Sports\ts{i}\t{text}\n"));
    }
    for (i, text) in COOKING.iter().enumerate() {
        src.push_str(&format!("Top/Cooking\tc{i}\t{text}\n"));
    }
    // below the threshold
    src.push_str("Top/Regional/Europe/Sports\tr0\tcricket test match in london\n");
    fs::write(path, src).unwrap();
}

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self { dir: tempfile::tempdir().unwrap() };
        write_taxonomy(&ws.path("dmoz.tsv"));
        fs::write(ws.path("filter.txt"), "# aliases\nTop/Regional/*/Sports\n").unwrap();
        ws
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    fn construct_json(&self) -> String {
        format!(
            r#"{{"rdfPath": "{}", "bow": "{}", "bowPart": "{}", "categoryMinSize": 6}}"#,
            self.path("dmoz.tsv").display(),
            self.path("corpus.bow").display(),
            self.path("corpus.part").display()
        )
    }

    fn init_json(&self) -> String {
        format!(
            r#"{{"bow": "{}", "bowPart": "{}", "filter": "{}", "classifier": "{}"}}"#,
            self.path("corpus.bow").display(),
            self.path("corpus.part").display(),
            self.path("filter.txt").display(),
            self.path("model.bin").display()
        )
    }

    fn train(&self) {
        construct(&ConstructConfig::from_json(&self.construct_json()).unwrap()).unwrap();
        init(&InitConfig::from_json(&self.init_json()).unwrap()).unwrap();
    }
}

#[test]
fn construct_init_load_classify() {
    let ws = Workspace::new();
    let summary = construct(&ConstructConfig::from_json(&ws.construct_json()).unwrap()).unwrap();
    assert_eq!(summary.documents, 13);
    // Top, Top/Cooking, Top/Sports; the regional branch is too small
    assert_eq!(summary.categories, 3);

    let corpus: BowCorpus = taxonomy_classifier::artifact::load(&ws.path("corpus.bow")).unwrap();
    let partition: CategoryPartition = taxonomy_classifier::artifact::load(&ws.path("corpus.part")).unwrap();
    assert_eq!(corpus.stats.doc_num(), 13);
    for entry in partition.categories.values() {
        assert!(entry.member_count >= 6);
    }

    let model = init(&InitConfig::from_json(&ws.init_json()).unwrap()).unwrap();
    assert_eq!(model.category_count(), 3);

    let classifier = Classifier::new();
    classifier.load(&LoadConfig::from_json(&format!(r#"{{"classifier": "{}"}}"#, ws.path("model.bin").display())).unwrap()).unwrap();
    assert_eq!(classifier.state(), ClassifierState::Ready);

    let out = classifier.classify("basketball game tonight", 3).unwrap();
    let names: Vec<_> = out.categories.iter().map(|c| c.category.as_str()).collect();
    let sports = names.iter().position(|n| *n == "Top/Sports").unwrap();
    let cooking = names.iter().position(|n| *n == "Top/Cooking").unwrap();
    assert!(sports < cooking);
    assert!(out.keywords.iter().any(|k| k == "basketbal"));

    let top = classifier.classify_top("garlic bread recipe").unwrap().unwrap();
    assert_eq!(top.category, "Cooking");

    assert!(classifier.classify("", 3).unwrap().is_empty());
    assert!(classifier.classify("basketball", 0).unwrap().is_empty());
}

#[test]
fn training_is_reproducible_byte_for_byte() {
    let ws = Workspace::new();
    ws.train();
    let first = fs::read(ws.path("model.bin")).unwrap();
    let first_bow = fs::read(ws.path("corpus.bow")).unwrap();
    ws.train();
    assert_eq!(fs::read(ws.path("model.bin")).unwrap(), first);
    assert_eq!(fs::read(ws.path("corpus.bow")).unwrap(), first_bow);
}

#[test]
fn missing_config_field_fails_before_io() {
    let ws = Workspace::new();
    let err = InitConfig::from_json(&format!(r#"{{"bow": "{}"}}"#, ws.path("corpus.bow").display())).unwrap_err();
    assert!(matches!(err, ClassifierError::InvalidConfig(_)));
    assert!(!ws.path("model.bin").exists());
}

#[test]
fn failed_stage_writes_nothing() {
    let ws = Workspace::new();
    let json = format!(
        r#"{{"rdfPath": "{}", "bow": "{}", "bowPart": "{}", "root": "Top/Nowhere"}}"#,
        ws.path("dmoz.tsv").display(),
        ws.path("corpus.bow").display(),
        ws.path("corpus.part").display()
    );
    let err = construct(&ConstructConfig::from_json(&json).unwrap()).unwrap_err();
    assert!(matches!(err, ClassifierError::InvalidArgument(_)));
    assert!(!ws.path("corpus.bow").exists());
    assert!(!ws.path("corpus.part").exists());

    let missing = format!(
        r#"{{"rdfPath": "{}", "bow": "{}", "bowPart": "{}"}}"#,
        ws.path("nope.tsv").display(),
        ws.path("corpus.bow").display(),
        ws.path("corpus.part").display()
    );
    let err = construct(&ConstructConfig::from_json(&missing).unwrap()).unwrap_err();
    assert!(matches!(err, ClassifierError::Io { .. }));
}

#[test]
fn corrupt_model_keeps_current_one() {
    let ws = Workspace::new();
    ws.train();
    let classifier = Classifier::new();
    classifier.load(&LoadConfig::new(ws.path("model.bin"))).unwrap();
    let before = classifier.classify("pasta with garlic", 2).unwrap();

    let bytes = fs::read(ws.path("model.bin")).unwrap();
    fs::write(ws.path("broken.bin"), &bytes[..bytes.len() / 2]).unwrap();
    let err = classifier.load(&LoadConfig::new(ws.path("broken.bin"))).unwrap_err();
    assert!(matches!(err, ClassifierError::Deserialization(_)));

    // a corpus artifact is not a model
    let err = classifier.load(&LoadConfig::new(ws.path("corpus.bow"))).unwrap_err();
    assert!(matches!(err, ClassifierError::Deserialization(_)));

    assert_eq!(classifier.state(), ClassifierState::Ready);
    assert_eq!(classifier.classify("pasta with garlic", 2).unwrap(), before);
}

#[test]
fn init_through_the_service_publishes() {
    let ws = Workspace::new();
    construct(&ConstructConfig::from_json(&ws.construct_json()).unwrap()).unwrap();
    let classifier = Classifier::new();
    classifier.init(&InitConfig::from_json(&ws.init_json()).unwrap()).unwrap();
    assert_eq!(classifier.state(), ClassifierState::Ready);
    assert!(ws.path("model.bin").exists());
    assert_eq!(classifier.classify("tennis scores", 10).unwrap().categories.len(), 3);
}

#[test]
fn failed_partition_write_keeps_corpus_off_disk() {
    let ws = Workspace::new();
    let json = format!(
        r#"{{"rdfPath": "{}", "bow": "{}", "bowPart": "{}", "categoryMinSize": 6}}"#,
        ws.path("dmoz.tsv").display(),
        ws.path("corpus.bow").display(),
        ws.path("missing").join("corpus.part").display()
    );
    let err = construct(&ConstructConfig::from_json(&json).unwrap()).unwrap_err();
    assert!(matches!(err, ClassifierError::Io { .. }));
    assert!(!ws.path("corpus.bow").exists());
    let leftovers: Vec<_> = fs::read_dir(ws.dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(leftovers.len(), 2, "{leftovers:?}");
}

#[test]
fn open_trains_when_no_model_exists() {
    let ws = Workspace::new();
    construct(&ConstructConfig::from_json(&ws.construct_json()).unwrap()).unwrap();
    assert!(!ws.path("model.bin").exists());

    let classifier = Classifier::new();
    let model = classifier.open(&InitConfig::from_json(&ws.init_json()).unwrap()).unwrap();
    assert_eq!(model.category_count(), 3);
    assert_eq!(classifier.state(), ClassifierState::Ready);
    assert!(ws.path("model.bin").exists());
}

#[test]
fn open_loads_an_existing_model() {
    let ws = Workspace::new();
    ws.train();
    let trained = fs::read(ws.path("model.bin")).unwrap();
    // without the corpus files only the load path can succeed
    fs::remove_file(ws.path("corpus.bow")).unwrap();
    fs::remove_file(ws.path("corpus.part")).unwrap();

    let classifier = Classifier::new();
    let model = classifier.open(&InitConfig::from_json(&ws.init_json()).unwrap()).unwrap();
    assert_eq!(model.category_count(), 3);
    assert_eq!(classifier.state(), ClassifierState::Ready);
    assert_eq!(fs::read(ws.path("model.bin")).unwrap(), trained);
    assert_eq!(classifier.classify_top("garlic bread recipe").unwrap().unwrap().category, "Cooking");
}
