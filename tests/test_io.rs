#[cfg(test)]
mod test_io {
    use approx::assert_relative_eq;
    use biosystem::prelude::{load_model, load_system, save_model, IOError, ModelDocument};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const CATALYSIS: &str = "tests/data/catalysis.json";

    #[test]
    fn test_load_model() {
        // ACT
        let doc = load_model(CATALYSIS).unwrap();

        // ASSERT
        assert_eq!(doc.name, "catalysis");
        assert_eq!(doc.compositors.len(), 3);
        assert_eq!(doc.pulses.len(), 5);
        assert_eq!(doc.pulses[4].target(), None);

        let setup = doc.setup.unwrap();
        assert_eq!(setup.min_samples, 500);
        assert_eq!(setup.drop_samples, 2);
    }

    #[test]
    fn test_loaded_system_simulates() {
        // ARRANGE
        let (mut system, doc) = load_system(CATALYSIS).unwrap();
        let setup = doc.setup.clone().unwrap_or_default();

        // ACT
        let trace = system
            .run_with([0.0, 25.0], &setup, biosystem::simulation::RK4)
            .unwrap();
        let pulses = system.run_pulses(&doc.pulses).unwrap();

        // ASSERT
        assert_eq!(trace.len(), 500);
        assert_relative_eq!(
            trace.final_state().unwrap()[0],
            10.0 * (-1.25f64).exp(),
            epsilon = 1e-8
        );
        assert_eq!(pulses.segments.len(), 4);
    }

    #[test]
    fn test_save_and_reload() {
        // ARRANGE
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let doc = load_model(CATALYSIS).unwrap();

        // ACT
        save_model(&path, &doc).unwrap();
        let reloaded = load_model(&path).unwrap();

        // ASSERT
        assert_eq!(reloaded, doc);
    }

    #[test]
    fn test_trace_csv_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        let (mut system, _) = load_system(CATALYSIS).unwrap();

        let trace = system.run([0.0, 1.0]).unwrap();
        trace
            .write_csv(std::fs::File::create(&path).unwrap())
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("time,A,B,E"));
        assert_eq!(lines.count(), 1000);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            load_model("tests/data/missing.json"),
            Err(IOError::FileNotFound(_))
        ));

        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let doc = ModelDocument {
            compositors: serde_json::from_str(r#"[{ "name": "t", "initial_value": 1.0 }]"#)
                .unwrap(),
            ..Default::default()
        };
        save_model(&path, &doc).unwrap();

        assert!(matches!(load_system(&path), Err(IOError::System(_))));
    }

    #[test]
    fn test_malformed_rate_law() {
        // ARRANGE
        let dir = tempdir().unwrap();
        let path = dir.path().join("malformed.json");
        std::fs::write(
            &path,
            r#"{
                "compositors": [{ "name": "A", "initial_value": 1.0 }],
                "parts": [{ "name": "r", "compositors": ["A"], "rates": ["k * * A"] }]
            }"#,
        )
        .unwrap();

        // ACT
        let result = load_model(&path);

        // ASSERT
        match result {
            Err(IOError::JsonParseError(e)) => assert!(e.to_string().contains("k * * A")),
            other => panic!("Expected a JSON parse error, got {:?}", other),
        }
    }
}
