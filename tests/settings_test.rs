//! Recursive settings reading against generated containers.

mod common;

use camels_archive::container::Container;
use camels_archive::settings::read_settings;
use serde_json::{json, Value};

#[test]
fn nesting_depth_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested.h5");
    {
        let file = hdf5::File::create(&path).unwrap();
        let settings = file.create_group("settings").unwrap();
        common::write_str(&settings, "top", "surface");
        let level1 = settings.create_group("daq").unwrap();
        common::write_f64(&level1, "rate", 100.0);
        let level2 = level1.create_group("filter").unwrap();
        common::write_str(&level2, "kind", "butterworth");
        let level3 = level2.create_group("coefficients").unwrap();
        common::write_f64_list(&level3, "a", &[1.0, -0.5]);
    }

    let container = Container::open(&path).unwrap();
    let settings = container.root().group("settings").unwrap();
    let tree = Value::Object(read_settings(&settings).unwrap());

    assert_eq!(tree["top"], json!("surface"));
    assert_eq!(tree["daq"]["rate"], json!(100.0));
    assert_eq!(tree["daq"]["filter"]["kind"], json!("butterworth"));
    assert_eq!(tree["daq"]["filter"]["coefficients"]["a"], json!([1.0, -0.5]));
}

#[test]
fn leaves_are_fully_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typed.h5");
    {
        let file = hdf5::File::create(&path).unwrap();
        let settings = file.create_group("settings").unwrap();
        common::write_str(&settings, "numeric_text", "250");
        common::write_str(&settings, "float_text", "0.25");
        common::write_str(&settings, "label", "fast mode");
        common::write_i64(&settings, "count", 7);
        common::write_f64_list(&settings, "gains", &[1.5, 2.5, 3.5]);
        common::write_str_list(&settings, "channels", &["chan_a", "chan_b"]);
        common::write_str_list(&settings, "solo", &["only"]);
    }

    let container = Container::open(&path).unwrap();
    let settings = container.root().group("settings").unwrap();
    let tree = Value::Object(read_settings(&settings).unwrap());

    // String datasets promote to numbers where possible.
    assert_eq!(tree["numeric_text"], json!(250));
    assert_eq!(tree["float_text"], json!(0.25));
    assert_eq!(tree["label"], json!("fast mode"));
    assert_eq!(tree["count"], json!(7));
    assert_eq!(tree["gains"], json!([1.5, 2.5, 3.5]));
    assert_eq!(tree["channels"], json!(["chan_a", "chan_b"]));
    // Single-element arrays collapse to their sole element.
    assert_eq!(tree["solo"], json!("only"));

    // No leaf survives as anything but plain JSON scalars and arrays.
    fn assert_normalized(value: &Value) {
        match value {
            Value::Object(map) => map.values().for_each(assert_normalized),
            Value::Array(items) => items.iter().for_each(assert_normalized),
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {}
            Value::Null => panic!("null leaked into the settings tree"),
        }
    }
    assert_normalized(&tree);
}
