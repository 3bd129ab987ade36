//! Unit tests for the wasmtime component loader.

use rstest::{fixture, rstest};

use super::*;
use crate::plugin::PluginPool;

const UPPER_COMPONENT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/upper.wat");

#[fixture]
fn upper() -> Arc<dyn PluginInstance> {
    ComponentLoader::new()
        .load(&PluginReference::new(UPPER_COMPONENT))
        .expect("fixture component loads")
}

#[rstest]
fn components_format_through_their_export(upper: Arc<dyn PluginInstance>) {
    let options = FormatOptions::with_width(40).with_variable("dialect", "postgres");
    let out = upper
        .format(b"select a from b", &options)
        .expect("plugin succeeds");
    assert_eq!(out, b"SELECT A FROM B");
}

#[rstest]
fn instances_are_reused_across_calls(upper: Arc<dyn PluginInstance>) {
    for text in ["one", "two", "three"] {
        let out = upper
            .format(text.as_bytes(), &FormatOptions::default())
            .expect("plugin succeeds");
        assert_eq!(out, text.to_ascii_uppercase().as_bytes());
    }
}

#[rstest]
fn error_variants_carry_the_plugin_message(upper: Arc<dyn PluginInstance>) {
    let err = upper
        .format(b"", &FormatOptions::default())
        .expect_err("empty input is rejected");
    assert_eq!(err, "empty input");
}

#[test]
fn file_urls_name_component_paths() {
    let reference = PluginReference::new(format!("file://{UPPER_COMPONENT}"));
    assert_eq!(
        component_path(&reference).expect("file URL"),
        PathBuf::from(UPPER_COMPONENT)
    );
    let pool = PluginPool::new(Arc::new(ComponentLoader::new()));
    let out = pool
        .format(&reference, b"x = 1", &FormatOptions::default())
        .expect("plugin succeeds");
    assert_eq!(out, b"X = 1");
}

#[rstest]
#[case::missing_file("/nonexistent/weft/fmt.wasm", "")]
#[case::unsupported_scheme("https://example.com/fmt.wasm", "unsupported plugin reference")]
fn unloadable_references_are_load_errors(#[case] reference: &str, #[case] message: &str) {
    let err = ComponentLoader::new()
        .load(&PluginReference::new(reference))
        .err()
        .expect("load fails");
    assert!(matches!(
        err,
        FormatError::PluginLoad { ref plugin_id, message: ref text }
            if plugin_id == reference && text.contains(message)
    ));
}

#[test]
fn wide_widths_saturate() {
    let options = FormatOptions::with_width(usize::MAX).with_variable("k", "v");
    let wasm = WasmOptions::from(&options);
    assert_eq!(wasm.width, u32::MAX);
    assert_eq!(wasm.variables, [(String::from("k"), String::from("v"))]);
}
