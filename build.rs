use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const LOCALES_DIR: &str = "locales";
const DEFAULT_LOCALE: &str = "en";

fn main() {
    println!("cargo:rerun-if-changed={LOCALES_DIR}");

    let locales = load_locales(Path::new(LOCALES_DIR));
    check_completeness(&locales);

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("cargo sets OUT_DIR"));
    fs::write(
        out_dir.join("calmform_i18n_generated.rs"),
        render(&locales),
    )
    .expect("write generated i18n table");
}

fn load_locales(dir: &Path) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut locales = BTreeMap::new();
    let entries = fs::read_dir(dir).unwrap_or_else(|error| {
        panic!("cannot read locale directory {}: {error}", dir.display())
    });

    for entry in entries {
        let path = entry.expect("locale directory entry").path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        println!("cargo:rerun-if-changed={}", path.display());

        let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|error| panic!("cannot read {}: {error}", path.display()));
        let table = toml::from_str::<toml::Table>(&content)
            .unwrap_or_else(|error| panic!("invalid locale file {}: {error}", path.display()));

        let mut messages = BTreeMap::new();
        for (key, value) in table {
            let Some(text) = value.as_str() else {
                panic!("{}: message `{key}` must be a string", path.display());
            };
            messages.insert(key, text.to_string());
        }
        locales.insert(locale.to_string(), messages);
    }

    locales
}

fn check_completeness(locales: &BTreeMap<String, BTreeMap<String, String>>) {
    let Some(reference) = locales.get(DEFAULT_LOCALE) else {
        panic!("default locale `{DEFAULT_LOCALE}` has no {LOCALES_DIR}/{DEFAULT_LOCALE}.toml");
    };

    for (locale, messages) in locales {
        for key in reference.keys() {
            if !messages.contains_key(key) {
                panic!("locale `{locale}` is missing message `{key}`");
            }
        }
    }
}

fn render(locales: &BTreeMap<String, BTreeMap<String, String>>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "pub(crate) const DEFAULT_LOCALE: &str = {DEFAULT_LOCALE:?};\n\n"
    ));
    out.push_str("pub(crate) static LOCALES: &[(&str, &[(&str, &str)])] = &[\n");
    for (locale, messages) in locales {
        out.push_str(&format!("    ({locale:?}, &[\n"));
        for (key, text) in messages {
            out.push_str(&format!("        ({key:?}, {text:?}),\n"));
        }
        out.push_str("    ]),\n");
    }
    out.push_str("];\n");
    out
}
