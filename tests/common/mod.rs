//! Shared HDF5 fixture construction for the integration tests.
//!
//! Builds measurement files shaped like the ones the CAMELS acquisition
//! tool writes: a `CAMELS_`-prefixed entry group with `measurement_details`,
//! `sample`, `instruments`, `user`, and `data` subgroups, plus the top-level
//! `file_type` attribute.

#![allow(dead_code)]

use hdf5::types::VarLenUnicode;
use hdf5::Group;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Entry key used by every fixture.
pub const ENTRY_KEY: &str = "CAMELS_20250304_171444";

/// Canonical start time literal.
pub const START_TIME: &str = "2025-03-04T17:14:44.175182+00:00";
/// Canonical end time literal.
pub const END_TIME: &str = "2025-03-04T17:14:55.439912+00:00";

/// Embedded script stand-in.
pub const PYTHON_SCRIPT: &str = "import sys\nprint('protocol finished!')\n";

pub fn vlu(value: &str) -> VarLenUnicode {
    value.parse().expect("fixture string contains no NUL bytes")
}

pub fn write_str(group: &Group, name: &str, value: &str) {
    group
        .new_dataset::<VarLenUnicode>()
        .create(name)
        .unwrap()
        .write_scalar(&vlu(value))
        .unwrap();
}

pub fn write_str_list(group: &Group, name: &str, values: &[&str]) {
    let data: Vec<VarLenUnicode> = values.iter().map(|value| vlu(value)).collect();
    group
        .new_dataset_builder()
        .with_data(&data)
        .create(name)
        .unwrap();
}

pub fn write_f64(group: &Group, name: &str, value: f64) {
    group
        .new_dataset::<f64>()
        .create(name)
        .unwrap()
        .write_scalar(&value)
        .unwrap();
}

pub fn write_f64_list(group: &Group, name: &str, values: &[f64]) {
    group
        .new_dataset_builder()
        .with_data(values)
        .create(name)
        .unwrap();
}

pub fn write_i64(group: &Group, name: &str, value: i64) {
    group
        .new_dataset::<i64>()
        .create(name)
        .unwrap()
        .write_scalar(&value)
        .unwrap();
}

/// How the fixture's sample subtree is shaped.
pub enum SampleShape {
    /// `sample/identifier/full_identifier` carrying an archive locator.
    FullIdentifier(&'static str),
    /// `sample/sample_id` + `sample/name`.
    PlainId(&'static str),
    /// Only `sample/name`.
    NameOnly,
    /// No sample group at all.
    Missing,
}

/// Fixture configuration; `default()` matches the canonical test file.
pub struct Fixture {
    pub file_name: &'static str,
    /// `None` omits the attribute (legacy files).
    pub file_type: Option<&'static str>,
    pub tags: &'static [&'static str],
    pub with_comments: bool,
    pub with_script: bool,
    pub sample: SampleShape,
    /// `Some` adds `fabrication/ELN-metadata/full_identifier` to the
    /// `demo` instrument.
    pub instrument_identifier: Option<&'static str>,
    /// `Some` adds `user/identifier/identifier`.
    pub user_identifier: Option<&'static str>,
    /// Measured channels written into the entry's `data` group.
    pub data: Vec<(&'static str, Vec<f64>)>,
}

impl Default for Fixture {
    fn default() -> Self {
        let motor: Vec<f64> = (0..11).map(|i| -1.0 + 0.2 * i as f64).collect();
        let detector: Vec<f64> = motor.iter().map(|&x| 1.0 - x * x).collect();
        Self {
            file_name: "test_CAMELS_file.nxs",
            file_type: Some("NOMAD CAMELS"),
            tags: &["Tag 1", "Tag 2"],
            with_comments: true,
            with_script: true,
            sample: SampleShape::NameOnly,
            instrument_identifier: None,
            user_identifier: None,
            data: vec![("demo_motorX", motor), ("demo_detectorX", detector)],
        }
    }
}

impl Fixture {
    /// A diode-tagged fixture whose plotted series lies on `y = 2x + 1`.
    pub fn diode() -> Self {
        let motor: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let detector: Vec<f64> = motor.iter().map(|&x| 2.0 * x + 1.0).collect();
        Self {
            tags: &["diode", "demo"],
            data: vec![("demo_motorX", motor), ("demo_detectorX", detector)],
            ..Self::default()
        }
    }

    /// Write the fixture into `dir` and return the file path.
    pub fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join(self.file_name);
        let file = hdf5::File::create(&path).unwrap();

        if let Some(file_type) = self.file_type {
            file.new_attr::<VarLenUnicode>()
                .create("file_type")
                .unwrap()
                .write_scalar(&vlu(file_type))
                .unwrap();
        }

        let entry = file.create_group(ENTRY_KEY).unwrap();

        let details = entry.create_group("measurement_details").unwrap();
        write_str(&details, "start_time", START_TIME);
        write_str(&details, "end_time", END_TIME);
        write_str(
            &details,
            "protocol_description",
            "This is the protocol description.\nNew Line.",
        );
        write_str(
            &details,
            "measurement_description",
            "Measurement Description Test Entry\nNew Line",
        );
        write_str(
            &details,
            "protocol_overview",
            "Sweep 'Simple_Sweep' demo_motorX:\n\tRead: ['demo_detectorX', 'demo_motorX']\n\tValues: (start: -1, stop: 1, points: 11):",
        );
        if self.with_comments {
            write_str(&details, "measurement_comments", "2025-03-04T18:14:46 Live Comment");
        }
        write_str_list(&details, "measurement_tags", self.tags);
        write_str(&details, "plan_name", "Protocol_plan");
        write_str(&details, "protocol_json", &protocol_json_text());
        write_str(&details, "session_name", "Session Name");
        if self.with_script {
            write_str(&details, "python_script", PYTHON_SCRIPT);
        }

        match self.sample {
            SampleShape::FullIdentifier(full_identifier) => {
                let sample = entry.create_group("sample").unwrap();
                write_str(&sample, "name", "default_sample");
                let identifier = sample.create_group("identifier").unwrap();
                write_str(&identifier, "full_identifier", full_identifier);
            }
            SampleShape::PlainId(sample_id) => {
                let sample = entry.create_group("sample").unwrap();
                write_str(&sample, "name", "default_sample");
                write_str(&sample, "sample_id", sample_id);
            }
            SampleShape::NameOnly => {
                let sample = entry.create_group("sample").unwrap();
                write_str(&sample, "name", "default_sample");
            }
            SampleShape::Missing => {}
        }

        let instruments = entry.create_group("instruments").unwrap();
        let demo = instruments.create_group("demo").unwrap();
        let settings = demo.create_group("settings").unwrap();
        write_f64_list(&settings, "mus", &[0.0, 3.0, -4.0]);
        write_f64_list(&settings, "amps", &[1.0, 2.0, 27.0]);
        write_f64_list(&settings, "sigmas", &[5.0, 7.0, 0.1]);
        write_str(&settings, "sweep_mode", "linear");
        write_str(&settings, "n_points", "11");
        if let Some(identifier) = self.instrument_identifier {
            let fabrication = demo.create_group("fabrication").unwrap();
            let metadata = fabrication.create_group("ELN-metadata").unwrap();
            write_str(&metadata, "full_identifier", identifier);
        }

        let user = entry.create_group("user").unwrap();
        write_str(&user, "name", "default_user");
        if let Some(identifier) = self.user_identifier {
            let user_identifier = user.create_group("identifier").unwrap();
            write_str(&user_identifier, "identifier", identifier);
        }

        let data = entry.create_group("data").unwrap();
        for (channel, values) in &self.data {
            write_f64_list(&data, channel, values);
        }

        path
    }

    /// Write the fixture into a fresh temp dir, returning the dir guard and
    /// the file path.
    pub fn write_to_tempdir(&self) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = self.write(dir.path());
        (dir, path)
    }
}

/// The protocol payload embedded in every fixture.
pub fn protocol_json_text() -> String {
    serde_json::json!({
        "description": "This is the protocol description.\nNew Line.",
        "session_name": "Session Name",
        "name": "Protocol",
        "tags": ["Tag 1", "Tag 2"],
        "measurement_description": "Measurement Description Test Entry\nNew Line",
        "loop_steps": [{
            "step_type": "Simple Sweep",
            "name": "Simple_Sweep",
            "has_children": false,
            "children": [],
            "plots": [{
                "plt_type": "X-Y plot",
                "x_axis": "demo_motorX",
                "y_axes": {"formula": ["demo_detectorX"], "axis": ["left"]},
                "name": "demo_detectorX vs. demo_motorX",
                "title": "",
                "xlabel": "",
                "ylabel": ""
            }],
            "read_channels": ["demo_detectorX", "demo_motorX"]
        }]
    })
    .to_string()
}
